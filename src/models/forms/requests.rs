use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::{FieldType, FormStatus, ReviewStatus};
use crate::models::common::PaginationQuery;

/// 字段定义
#[derive(Debug, Clone, Deserialize)]
pub struct FormFieldInput {
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// 创建表单请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormRequest {
    /// 仅管理员需要指定
    pub school_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>, // ISO 8601 格式，如 "2026-05-01T08:00:00Z"
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: DateTime<Utc>,
    pub reminder_schedule: Option<Vec<String>>,
    #[serde(default)]
    pub fields: Vec<FormFieldInput>,
}

/// 更新表单请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub reminder_schedule: Option<Vec<String>>,
    /// 提供时整体替换字段列表
    pub fields: Option<Vec<FormFieldInput>>,
}

/// 写入存储层的新表单
#[derive(Debug, Clone)]
pub struct NewPermissionForm {
    pub school_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: DateTime<Utc>,
    pub reminder_schedule: Vec<String>,
    pub fields: Vec<FormFieldInput>,
}

/// 存储层的表单更新
///
/// `expected_status` 为写入条件，表单状态已变化时更新失败。
#[derive(Debug, Clone, Default)]
pub struct FormChanges {
    pub expected_status: Option<FormStatus>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub reminder_schedule: Option<Vec<String>>,
    pub review_status: Option<ReviewStatus>,
    pub fields: Option<Vec<FormFieldInput>>,
}

/// 审核请求
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewFormRequest {
    pub approve: bool,
    pub comment: Option<String>,
}

/// 分发目标（多个条件取并集）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistributeFormRequest {
    #[serde(default)]
    pub student_ids: Vec<i64>,
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub all_students: bool,
}

impl DistributeFormRequest {
    pub fn is_empty(&self) -> bool {
        !self.all_students
            && self.student_ids.is_empty()
            && self.grades.is_empty()
            && self.groups.is_empty()
    }
}

/// 表单列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize)]
pub struct FormListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<FormStatus>,
    pub review_status: Option<ReviewStatus>,
    pub school_id: Option<i64>,
    pub search: Option<String>,
}

// 用于存储层的内部查询参数
#[derive(Debug, Clone, Default)]
pub struct FormListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub status: Option<FormStatus>,
    pub review_status: Option<ReviewStatus>,
    pub school_id: Option<i64>,
    /// 仅返回该用户创建或被共享的表单
    pub visible_to: Option<i64>,
    pub search: Option<String>,
}
