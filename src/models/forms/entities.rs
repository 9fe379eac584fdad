use serde::{Deserialize, Serialize};

use crate::define_string_enum;

define_string_enum! {
    /// 表单状态
    pub enum FormStatus {
        Draft => "draft",
        Active => "active",
        Closed => "closed",
    }
}

define_string_enum! {
    /// 审核状态
    pub enum ReviewStatus {
        None => "none",
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

define_string_enum! {
    /// 自定义字段类型
    pub enum FieldType {
        Text => "text",
        Textarea => "textarea",
        Checkbox => "checkbox",
        Select => "select",
        Date => "date",
    }
}

// 许可表单实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionForm {
    pub id: i64,
    pub school_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<chrono::DateTime<chrono::Utc>>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub status: FormStatus,
    pub review_status: ReviewStatus,
    pub review_comment: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reminder_schedule: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PermissionForm {
    /// 表单是否仍可签署
    pub fn accepts_signatures(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.status == FormStatus::Active && now < self.deadline
    }
}

// 表单自定义字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: i64,
    pub form_id: i64,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Vec<String>,
    pub position: i32,
}
