use serde::Serialize;

/// 待提醒的提交，连同家长联系方式
#[derive(Debug, Clone)]
pub struct PendingReminder {
    pub submission_id: i64,
    pub form_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub parent_id: i64,
    pub parent_email: String,
    pub parent_name: String,
    pub submission_created_at: chrono::DateTime<chrono::Utc>,
}

// 提醒发送记录
#[derive(Debug, Clone, Serialize)]
pub struct ReminderLog {
    pub id: i64,
    pub submission_id: i64,
    pub form_id: i64,
    pub offset_minutes: i64,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}
