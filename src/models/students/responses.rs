use serde::Serialize;

use super::entities::{Student, StudentParent};
use crate::models::common::PaginatedResponse;

pub type StudentListResponse = PaginatedResponse<Student>;

// 学生详情
#[derive(Debug, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub parents: Vec<StudentParent>,
}

// 导入失败的行
#[derive(Debug, Clone, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

// 学生导入结果
#[derive(Debug, Default, Serialize)]
pub struct StudentImportResponse {
    pub students_created: usize,
    pub parents_created: usize,
    pub parents_linked: usize,
    pub errors: Vec<ImportRowError>,
}

// 关联家长结果
#[derive(Debug, Serialize)]
pub struct LinkParentResponse {
    pub parent: crate::models::users::entities::User,
    /// 是否新建了家长账号
    pub parent_created: bool,
    /// false 表示此前已关联
    pub linked: bool,
}
