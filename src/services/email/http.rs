use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{EmailMessage, EmailSender};
use crate::config::EmailConfig;
use crate::errors::{PermissionError, Result};

/// Resend 兼容的 HTTP 邮件接口
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let body = SendEmailBody {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PermissionError::email(format!(
                "邮件接口返回 {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        debug!("邮件已发送到 {}: {}", message.to, message.subject);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
