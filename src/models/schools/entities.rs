use serde::{Deserialize, Serialize};

// 学校实体（租户）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// 表单发布前是否需要审核
    pub require_form_review: bool,
    /// 学校默认提醒计划，为空时使用全局默认值
    pub reminder_schedule: Option<Vec<String>>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
