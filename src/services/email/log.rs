use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use super::{EmailMessage, EmailSender};
use crate::errors::Result;

/// 只把邮件写入日志，开发环境默认使用
///
/// 同时保留一份发件记录，便于测试断言。
#[derive(Default)]
pub struct LogEmailSender {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl LogEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "邮件(未发送):\n{}",
            message.text
        );
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(message.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
