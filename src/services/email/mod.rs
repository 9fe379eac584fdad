//! 邮件发送
//!
//! `email.provider` 决定后端：`http` 调用事务邮件 API，`log` 只写日志。
//! 调用方负责记录并统计失败，邮件失败不回滚业务数据。

pub mod http;
pub mod log;
pub mod templates;

pub use http::HttpEmailSender;
pub use log::LogEmailSender;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{AppConfig, EmailConfig};
use crate::errors::{PermissionError, Result};

/// 一封待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// 依次发送，返回 (成功数, 失败数)
pub async fn send_all(sender: &dyn EmailSender, messages: &[EmailMessage]) -> (usize, usize) {
    let mut sent = 0;
    let mut failed = 0;
    for message in messages {
        match sender.send(message).await {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::warn!("发送邮件到 {} 失败: {}", message.to, e);
                failed += 1;
            }
        }
    }
    (sent, failed)
}

pub fn create_email_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    match config.provider.as_str() {
        "http" => {
            if config.api_key.is_empty() {
                return Err(PermissionError::email(
                    "email.provider 为 http 时必须配置 email.api_key",
                ));
            }
            Ok(Arc::new(HttpEmailSender::new(config)?))
        }
        "log" => {
            if AppConfig::get().is_production() {
                tracing::warn!("生产环境使用 log 邮件后端，邮件不会真正发出");
            }
            Ok(Arc::new(LogEmailSender::new()))
        }
        other => Err(PermissionError::email(format!(
            "不支持的邮件后端: {other}，可选 http / log"
        ))),
    }
}
