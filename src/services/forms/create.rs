use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;

use super::FormService;
use super::validation::{normalize_fields, normalize_text, normalize_title, validate_deadline};
use crate::config::AppConfig;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::requests::{CreateFormRequest, NewPermissionForm},
};
use crate::services::reminders::schedule::resolve_schedule;
use crate::services::{audit, bad_request, current_user, not_found, storage_error, target_school};

pub async fn create_form(
    service: &FormService,
    mut form: CreateFormRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let school_id = match target_school(&actor, form.school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = normalize_title(&mut form.title) {
        return Ok(bad_request(ErrorCode::FormInvalid, msg));
    }
    if let Err(msg) = validate_deadline(form.deadline, Utc::now()) {
        return Ok(bad_request(ErrorCode::FormDeadlineInvalid, msg));
    }
    if let Err(msg) = normalize_fields(&mut form.fields) {
        return Ok(bad_request(ErrorCode::FormInvalid, msg));
    }
    let texts = (
        normalize_text(form.description, "Description", 5000),
        normalize_text(form.event_type, "Event type", 100),
        normalize_text(form.location, "Location", 200),
    );
    let (description, event_type, location) = match texts {
        (Ok(d), Ok(t), Ok(l)) => (d, t, l),
        (Err(msg), _, _) | (_, Err(msg), _) | (_, _, Err(msg)) => {
            return Ok(bad_request(ErrorCode::FormInvalid, msg));
        }
    };

    let storage = service.get_storage(request)?;
    let school = match storage.get_school_by_id(school_id).await {
        Ok(Some(school)) => school,
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => return Ok(storage_error("创建表单", e)),
    };

    // 表单计划优先，其次学校默认，最后全局默认
    let schedule = match resolve_schedule(
        form.reminder_schedule.as_deref(),
        school.reminder_schedule.as_deref(),
        &AppConfig::get().reminders.default_schedule,
    ) {
        Ok(schedule) => schedule,
        Err(msg) => return Ok(bad_request(ErrorCode::ReminderScheduleInvalid, msg)),
    };

    let new_form = NewPermissionForm {
        school_id,
        created_by: actor.id,
        title: form.title,
        description,
        event_date: form.event_date,
        event_type,
        location,
        deadline: form.deadline,
        reminder_schedule: schedule.to_strings(),
        fields: form.fields,
    };

    match storage.create_form(new_form).await {
        Ok(form) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("form.create", "form", Some(form.id))
                    .school(Some(school_id))
                    .actor(actor.id)
                    .details(json!({ "title": form.title })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(form, "表单创建成功")))
        }
        Err(e) => Ok(storage_error("创建表单", e)),
    }
}
