use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::define_string_enum;

define_string_enum! {
    /// 签署状态
    pub enum SubmissionStatus {
        Pending => "pending",
        Signed => "signed",
        Declined => "declined",
    }
}

/// 字段回答，键为字段 ID 的字符串形式
pub type FieldResponses = BTreeMap<String, serde_json::Value>;

// 表单提交实体（一个学生对应一条）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: i64,
    pub form_id: i64,
    pub student_id: i64,
    pub parent_id: Option<i64>,
    pub status: SubmissionStatus,
    pub signature: Option<String>,
    pub decline_reason: Option<String>,
    pub responses: FieldResponses,
    pub signed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_reminded_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl FormSubmission {
    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}
