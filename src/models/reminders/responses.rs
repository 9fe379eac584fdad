use serde::Serialize;

/// 定时提醒执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CronRunReport {
    pub forms_scanned: usize,
    pub reminders_sent: usize,
    pub reminders_failed: usize,
    pub reminders_skipped: usize,
    pub forms_closed: usize,
}

/// 手动提醒结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManualReminderResult {
    pub pending_submissions: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
}
