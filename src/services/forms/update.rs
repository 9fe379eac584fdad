use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;

use super::FormService;
use super::access::{FormAccess, load_form};
use super::validation::{normalize_fields, normalize_text, normalize_title, validate_deadline};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::{
        entities::{FormStatus, ReviewStatus},
        requests::{FormChanges, UpdateFormRequest},
    },
};
use crate::services::reminders::schedule::ReminderSchedule;
use crate::services::{
    audit, bad_request, conflict, current_user, not_found, storage_error,
};

pub async fn update_form(
    service: &FormService,
    id: i64,
    mut update: UpdateFormRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Manage, "更新表单").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    match form.status {
        FormStatus::Closed => {
            return Ok(conflict(ErrorCode::FormInvalidState, "已关闭的表单不能修改"));
        }
        // 已发布的表单只能调整截止时间和提醒计划
        FormStatus::Active
            if update.title.is_some()
                || update.description.is_some()
                || update.event_date.is_some()
                || update.event_type.is_some()
                || update.location.is_some()
                || update.fields.is_some() =>
        {
            return Ok(conflict(
                ErrorCode::FormInvalidState,
                "已发布的表单只能修改截止时间和提醒计划",
            ));
        }
        _ => {}
    }

    if let Some(title) = update.title.as_mut()
        && let Err(msg) = normalize_title(title)
    {
        return Ok(bad_request(ErrorCode::FormInvalid, msg));
    }
    if let Some(deadline) = update.deadline
        && let Err(msg) = validate_deadline(deadline, Utc::now())
    {
        return Ok(bad_request(ErrorCode::FormDeadlineInvalid, msg));
    }
    if let Some(fields) = update.fields.as_mut()
        && let Err(msg) = normalize_fields(fields)
    {
        return Ok(bad_request(ErrorCode::FormInvalid, msg));
    }
    let texts = (
        normalize_text(update.description.take(), "Description", 5000),
        normalize_text(update.event_type.take(), "Event type", 100),
        normalize_text(update.location.take(), "Location", 200),
    );
    let (description, event_type, location) = match texts {
        (Ok(d), Ok(t), Ok(l)) => (d, t, l),
        (Err(msg), _, _) | (_, Err(msg), _) | (_, _, Err(msg)) => {
            return Ok(bad_request(ErrorCode::FormInvalid, msg));
        }
    };
    let reminder_schedule = match update.reminder_schedule.as_deref().map(ReminderSchedule::parse) {
        Some(Ok(schedule)) => Some(schedule.to_strings()),
        Some(Err(msg)) => return Ok(bad_request(ErrorCode::ReminderScheduleInvalid, msg)),
        None => None,
    };

    // 需要审核的学校里，草稿修改后须重新审核
    let mut review_status = None;
    if form.status == FormStatus::Draft
        && matches!(form.review_status, ReviewStatus::Approved | ReviewStatus::Rejected)
    {
        match storage.get_school_by_id(form.school_id).await {
            Ok(Some(school)) if school.require_form_review => review_status = Some(ReviewStatus::None),
            Ok(_) => {}
            Err(e) => return Ok(storage_error("更新表单", e)),
        }
    }

    let changed_fields: Vec<&str> = [
        ("title", update.title.is_some()),
        ("description", description.is_some()),
        ("event_date", update.event_date.is_some()),
        ("event_type", event_type.is_some()),
        ("location", location.is_some()),
        ("deadline", update.deadline.is_some()),
        ("reminder_schedule", reminder_schedule.is_some()),
        ("fields", update.fields.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, changed)| changed.then_some(name))
    .collect();

    let changes = FormChanges {
        expected_status: Some(form.status),
        title: update.title,
        description,
        event_date: update.event_date,
        event_type,
        location,
        deadline: update.deadline,
        reminder_schedule,
        review_status,
        fields: update.fields,
    };

    match storage.update_form(id, changes).await {
        Ok(Some(updated)) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("form.update", "form", Some(id))
                    .school(Some(updated.school_id))
                    .actor(actor.id)
                    .details(json!({
                        "fields": changed_fields,
                        "review_reset": review_status.is_some(),
                    })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "表单更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        // 读取后表单状态被并发修改
        Err(e) if e.is_conflict() => Ok(conflict(
            ErrorCode::FormInvalidState,
            "表单状态已变化，请刷新后重试",
        )),
        Err(e) => Ok(storage_error("更新表单", e)),
    }
}
