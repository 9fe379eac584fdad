use serde::Serialize;

use super::entities::FormSubmission;
use crate::models::common::PaginatedResponse;
use crate::models::forms::entities::{FormField, PermissionForm};
use crate::models::students::entities::Student;

/// 表单提交列表项（教师视角）
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionListItem {
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub student_name: String,
    pub grade: String,
    pub group_name: Option<String>,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
}

pub type SubmissionListResponse = PaginatedResponse<SubmissionListItem>;

/// 家长视角的提交项
#[derive(Debug, Clone, Serialize)]
pub struct ParentSubmissionItem {
    pub submission: FormSubmission,
    pub student: Student,
    pub form: PermissionForm,
}

/// 提交详情
#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub submission: FormSubmission,
    pub student: Student,
    pub form: PermissionForm,
    pub fields: Vec<FormField>,
}
