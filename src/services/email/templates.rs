//! 邮件模板
//!
//! 所有用户输入的文本在写入 HTML 前都会转义。

use chrono::{DateTime, Utc};

use super::EmailMessage;
use crate::config::AppConfig;
use crate::models::forms::entities::PermissionForm;
use crate::utils::escape_html;

/// 模板公共信息
#[derive(Debug, Clone)]
pub struct Branding {
    pub system_name: String,
    pub base_url: String,
}

impl Branding {
    pub fn from_config() -> Self {
        let config = AppConfig::get();
        Self {
            system_name: config.app.system_name.clone(),
            base_url: config.app.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn wrap(&self, to: &str, subject: String, body_html: String, text: String) -> EmailMessage {
        let html = format!(
            "<!DOCTYPE html><html><body style=\"font-family:sans-serif;line-height:1.5\">\
             {body_html}<hr><p style=\"color:#888;font-size:12px\">{}</p></body></html>",
            escape_html(&self.system_name)
        );
        EmailMessage {
            to: to.to_string(),
            subject,
            html,
            text: format!("{text}\n\n-- {}", self.system_name),
        }
    }
}

fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn html_list(items: &[String]) -> String {
    let entries: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect();
    format!("<ul>{entries}</ul>")
}

fn text_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn button(url: &str, label: &str) -> String {
    format!(
        "<p><a href=\"{}\" style=\"display:inline-block;padding:10px 18px;background:#2563eb;\
         color:#fff;text-decoration:none;border-radius:4px\">{}</a></p>",
        escape_html(url),
        escape_html(label)
    )
}

pub fn magic_link(
    branding: &Branding,
    to: &str,
    name: &str,
    token: &str,
    expires_minutes: i64,
) -> EmailMessage {
    let url = branding.link(&format!("/auth/verify?token={token}"));
    let subject = format!("Your sign-in link for {}", branding.system_name);
    let html = format!(
        "<p>Hi {},</p><p>Use the button below to sign in. The link expires in {} minutes \
         and can be used once.</p>{}<p>If you did not request this email you can ignore it.</p>",
        escape_html(name),
        expires_minutes,
        button(&url, "Sign in")
    );
    let text = format!(
        "Hi {name},\n\nSign in with this link (valid for {expires_minutes} minutes, single use):\n{url}\n\n\
         If you did not request this email you can ignore it."
    );
    branding.wrap(to, subject, html, text)
}

pub fn form_distributed(
    branding: &Branding,
    to: &str,
    parent_name: &str,
    form: &PermissionForm,
    students: &[String],
) -> EmailMessage {
    let url = branding.link("/parent/submissions");
    let deadline = format_deadline(form.deadline);
    let subject = format!("Permission needed: {}", form.title);
    let html = format!(
        "<p>Hi {},</p><p>Your signature is requested for <strong>{}</strong> for:</p>{}\
         <p>Please respond before <strong>{}</strong>.</p>{}",
        escape_html(parent_name),
        escape_html(&form.title),
        html_list(students),
        deadline,
        button(&url, "Review and sign")
    );
    let text = format!(
        "Hi {parent_name},\n\nYour signature is requested for \"{}\" for:\n{}\n\n\
         Please respond before {deadline}:\n{url}",
        form.title,
        text_list(students)
    );
    branding.wrap(to, subject, html, text)
}

pub fn reminder(
    branding: &Branding,
    to: &str,
    parent_name: &str,
    form: &PermissionForm,
    students: &[String],
) -> EmailMessage {
    let url = branding.link("/parent/submissions");
    let deadline = format_deadline(form.deadline);
    let subject = format!("Reminder: {} is awaiting your signature", form.title);
    let html = format!(
        "<p>Hi {},</p><p><strong>{}</strong> still needs your response for:</p>{}\
         <p>The deadline is <strong>{}</strong>.</p>{}",
        escape_html(parent_name),
        escape_html(&form.title),
        html_list(students),
        deadline,
        button(&url, "Respond now")
    );
    let text = format!(
        "Hi {parent_name},\n\n\"{}\" still needs your response for:\n{}\n\n\
         The deadline is {deadline}:\n{url}",
        form.title,
        text_list(students)
    );
    branding.wrap(to, subject, html, text)
}

pub fn signature_confirmation(
    branding: &Branding,
    to: &str,
    parent_name: &str,
    form: &PermissionForm,
    student_name: &str,
) -> EmailMessage {
    let subject = format!("Signed: {}", form.title);
    let html = format!(
        "<p>Hi {},</p><p>Thank you. Your permission for <strong>{}</strong> \
         to take part in <strong>{}</strong> has been recorded.</p>",
        escape_html(parent_name),
        escape_html(student_name),
        escape_html(&form.title)
    );
    let text = format!(
        "Hi {parent_name},\n\nThank you. Your permission for {student_name} to take part in \"{}\" has been recorded.",
        form.title
    );
    branding.wrap(to, subject, html, text)
}

pub fn decline_confirmation(
    branding: &Branding,
    to: &str,
    parent_name: &str,
    form: &PermissionForm,
    student_name: &str,
    reason: Option<&str>,
) -> EmailMessage {
    let subject = format!("Declined: {}", form.title);
    let reason_html = reason
        .map(|r| format!("<p>Reason given: {}</p>", escape_html(r)))
        .unwrap_or_default();
    let reason_text = reason
        .map(|r| format!("\nReason given: {r}"))
        .unwrap_or_default();
    let html = format!(
        "<p>Hi {},</p><p>You declined <strong>{}</strong> for <strong>{}</strong>. \
         The school has been notified.</p>{}",
        escape_html(parent_name),
        escape_html(&form.title),
        escape_html(student_name),
        reason_html
    );
    let text = format!(
        "Hi {parent_name},\n\nYou declined \"{}\" for {student_name}. The school has been notified.{reason_text}",
        form.title
    );
    branding.wrap(to, subject, html, text)
}

pub fn review_requested(
    branding: &Branding,
    to: &str,
    reviewer_name: &str,
    form: &PermissionForm,
    author_name: &str,
) -> EmailMessage {
    let url = branding.link(&format!("/forms/{}", form.id));
    let subject = format!("Review requested: {}", form.title);
    let html = format!(
        "<p>Hi {},</p><p>{} submitted <strong>{}</strong> for review.</p>{}",
        escape_html(reviewer_name),
        escape_html(author_name),
        escape_html(&form.title),
        button(&url, "Open form")
    );
    let text = format!(
        "Hi {reviewer_name},\n\n{author_name} submitted \"{}\" for review:\n{url}",
        form.title
    );
    branding.wrap(to, subject, html, text)
}

pub fn review_decision(
    branding: &Branding,
    to: &str,
    author_name: &str,
    form: &PermissionForm,
    approved: bool,
    comment: Option<&str>,
) -> EmailMessage {
    let url = branding.link(&format!("/forms/{}", form.id));
    let verdict = if approved { "approved" } else { "rejected" };
    let subject = format!("Form {verdict}: {}", form.title);
    let comment_html = comment
        .map(|c| format!("<blockquote>{}</blockquote>", escape_html(c)))
        .unwrap_or_default();
    let comment_text = comment.map(|c| format!("\n\n> {c}")).unwrap_or_default();
    let html = format!(
        "<p>Hi {},</p><p><strong>{}</strong> was {verdict}.</p>{}{}",
        escape_html(author_name),
        escape_html(&form.title),
        comment_html,
        button(&url, "Open form")
    );
    let text = format!(
        "Hi {author_name},\n\n\"{}\" was {verdict}.{comment_text}\n\n{url}",
        form.title
    );
    branding.wrap(to, subject, html, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forms::entities::{FormStatus, ReviewStatus};

    fn branding() -> Branding {
        Branding {
            system_name: "Permission Please".to_string(),
            base_url: "https://slips.example.org".to_string(),
        }
    }

    fn form(title: &str) -> PermissionForm {
        let now = Utc::now();
        PermissionForm {
            id: 7,
            school_id: 1,
            created_by: 2,
            title: title.to_string(),
            description: None,
            event_date: None,
            event_type: None,
            location: None,
            deadline: now,
            status: FormStatus::Active,
            review_status: ReviewStatus::None,
            review_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            reminder_schedule: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_magic_link_contains_verify_url() {
        let msg = magic_link(&branding(), "p@example.org", "Pat", "abc123", 15);
        assert_eq!(msg.to, "p@example.org");
        assert!(msg.text.contains("https://slips.example.org/auth/verify?token=abc123"));
        assert!(msg.html.contains("15 minutes"));
    }

    #[test]
    fn test_user_text_is_escaped_in_html() {
        let msg = form_distributed(
            &branding(),
            "p@example.org",
            "<script>x</script>",
            &form("Zoo & <Aquarium>"),
            &["Ada \"Al\" Lovelace".to_string()],
        );
        assert!(!msg.html.contains("<script>"));
        assert!(msg.html.contains("Zoo &amp; &lt;Aquarium&gt;"));
        assert!(msg.html.contains("&quot;Al&quot;"));
        // 纯文本版本保留原文
        assert!(msg.text.contains("Zoo & <Aquarium>"));
    }

    #[test]
    fn test_reminder_lists_every_student() {
        let students = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];
        let msg = reminder(&branding(), "p@example.org", "Pat", &form("Museum"), &students);
        assert!(msg.subject.starts_with("Reminder:"));
        for student in &students {
            assert!(msg.html.contains(student.as_str()));
            assert!(msg.text.contains(student.as_str()));
        }
    }

    #[test]
    fn test_review_decision_mentions_verdict_and_comment() {
        let msg = review_decision(
            &branding(),
            "t@example.org",
            "Tess",
            &form("Trip"),
            false,
            Some("Needs a <location>"),
        );
        assert!(msg.subject.contains("rejected"));
        assert!(msg.html.contains("Needs a &lt;location&gt;"));
        assert!(msg.text.contains("/forms/7"));
    }

    #[test]
    fn test_decline_without_reason() {
        let msg = decline_confirmation(&branding(), "p@example.org", "Pat", &form("Trip"), "Ada", None);
        assert!(!msg.text.contains("Reason given"));
    }
}
