use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use tracing::warn;

use super::ReminderService;
use super::cron::recipient;
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog,
    reminders::responses::ManualReminderResult,
};
use crate::services::email::templates;
use crate::services::forms::access::{FormAccess, load_form};
use crate::services::forms::distribution::group_by_parent;
use crate::services::{audit, conflict, current_user, storage_error};

/// 立即提醒所有未签署的家长，不受提醒计划限制
pub async fn remind_form(
    service: &ReminderService,
    form_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;
    let sender = service.get_email_sender(request)?;

    let (form, _) =
        match load_form(storage.as_ref(), &actor, form_id, FormAccess::Manage, "发送提醒").await {
            Ok(found) => found,
            Err(resp) => return Ok(resp),
        };

    let now = Utc::now();
    if !form.accepts_signatures(now) {
        return Ok(conflict(ErrorCode::FormInvalidState, "只能提醒进行中且未截止的表单"));
    }

    let rows = match storage.list_pending_reminders(form.id).await {
        Ok(rows) => rows,
        Err(e) => return Ok(storage_error("发送提醒", e)),
    };
    let pending: HashSet<i64> = rows.iter().map(|row| row.submission_id).collect();
    let notices = group_by_parent(rows.iter().map(recipient));

    let branding = templates::Branding::from_config();
    let mut result = ManualReminderResult {
        pending_submissions: pending.len(),
        ..Default::default()
    };
    let mut delivered: HashSet<i64> = HashSet::new();
    for notice in &notices {
        let message =
            templates::reminder(&branding, &notice.email, &notice.name, &form, &notice.students);
        match sender.send(&message).await {
            Ok(()) => {
                result.emails_sent += 1;
                delivered.extend(notice.submission_ids.iter().copied());
            }
            Err(e) => {
                warn!("发送提醒到 {} 失败: {}", notice.email, e);
                result.emails_failed += 1;
            }
        }
    }

    let delivered: Vec<i64> = delivered.into_iter().collect();
    if !delivered.is_empty()
        && let Err(e) = storage.mark_submissions_reminded(&delivered, now).await
    {
        warn!("更新表单 {} 的提醒时间失败: {}", form.id, e);
    }

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("form.remind", "form", Some(form.id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!(result)),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result, "提醒已发送")))
}
