//! HTTP 邮件后端集成测试

use httpmock::prelude::*;
use serde_json::json;

use permission_please::config::EmailConfig;
use permission_please::services::email::{EmailMessage, EmailSender, HttpEmailSender};

fn config(api_url: String) -> EmailConfig {
    EmailConfig {
        provider: "http".to_string(),
        api_url,
        api_key: "re_test_key".to_string(),
        from_address: "Permission Please <noreply@maple.edu>".to_string(),
        timeout: 5,
    }
}

fn message() -> EmailMessage {
    EmailMessage {
        to: "parent@example.com".to_string(),
        subject: "Action needed: Aquarium field trip".to_string(),
        html: "<p>Please sign</p>".to_string(),
        text: "Please sign".to_string(),
    }
}

#[tokio::test]
async fn test_http_sender_posts_resend_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/emails")
                .header("authorization", "Bearer re_test_key")
                .json_body(json!({
                    "from": "Permission Please <noreply@maple.edu>",
                    "to": ["parent@example.com"],
                    "subject": "Action needed: Aquarium field trip",
                    "html": "<p>Please sign</p>",
                    "text": "Please sign"
                }));
            then.status(200).json_body(json!({ "id": "email_123" }));
        })
        .await;

    let sender = HttpEmailSender::new(&config(server.url("/emails"))).expect("build sender");
    sender.send(&message()).await.expect("send succeeds");

    mock.assert_async().await;
    assert_eq!(sender.name(), "http");
}

#[tokio::test]
async fn test_http_sender_reports_provider_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/emails");
            then.status(422).body("invalid from address");
        })
        .await;

    let sender = HttpEmailSender::new(&config(server.url("/emails"))).expect("build sender");
    let err = sender.send(&message()).await.expect_err("send fails");

    assert_eq!(err.code(), "E014");
    assert!(err.message().contains("422"));
    assert!(err.message().contains("invalid from address"));
}
