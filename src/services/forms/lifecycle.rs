//! 表单状态流转：发布、关闭、重新开放

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::entities::{FormStatus, PermissionForm, ReviewStatus},
    users::entities::User,
};
use crate::services::{audit, conflict, current_user, forbidden, not_found, storage_error};
use crate::storage::Storage;

/// 检查状态流转是否允许，返回错误码与消息
pub fn check_transition(
    form: &PermissionForm,
    target: FormStatus,
    require_review: bool,
    now: chrono::DateTime<Utc>,
) -> Result<(), (ErrorCode, &'static str)> {
    match (form.status, target) {
        (FormStatus::Draft, FormStatus::Active) => {
            if require_review && form.review_status != ReviewStatus::Approved {
                return Err((ErrorCode::FormReviewRequired, "表单需要审核通过后才能发布"));
            }
            if form.deadline <= now {
                return Err((ErrorCode::FormDeadlineInvalid, "截止时间已过，请先修改截止时间"));
            }
            Ok(())
        }
        (FormStatus::Active, FormStatus::Closed) => Ok(()),
        (FormStatus::Closed, FormStatus::Active) => {
            if form.deadline <= now {
                return Err((ErrorCode::FormDeadlineInvalid, "截止时间已过，不能重新开放"));
            }
            Ok(())
        }
        _ => Err((ErrorCode::FormInvalidState, "当前状态不允许此操作")),
    }
}

async fn transition(
    service: &FormService,
    id: i64,
    target: FormStatus,
    action: &str,
    message: &str,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Manage, action).await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    let require_review = match storage.get_school_by_id(form.school_id).await {
        Ok(school) => school.is_some_and(|s| s.require_form_review),
        Err(e) => return Ok(storage_error(action, e)),
    };

    if let Err((code, msg)) = check_transition(&form, target, require_review, Utc::now()) {
        return Ok(if code == ErrorCode::FormReviewRequired {
            forbidden(code, msg)
        } else {
            conflict(code, msg)
        });
    }

    // 写入时再次校验来源状态与审核状态，并发的编辑或操作会让这里失败
    let require_approved = require_review && form.status == FormStatus::Draft;
    match storage
        .transition_form_status(id, form.status, target, require_approved)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return Ok(conflict(ErrorCode::FormInvalidState, "表单状态已变化，请刷新后重试"));
        }
        Err(e) => return Ok(storage_error(action, e)),
    }

    match storage.get_form_by_id(id).await {
        Ok(Some(updated)) => {
            record_transition(storage.as_ref(), request, &actor, &form, target).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, message)))
        }
        Ok(None) => Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => Ok(storage_error(action, e)),
    }
}

async fn record_transition(
    storage: &dyn Storage,
    request: &HttpRequest,
    actor: &User,
    form: &PermissionForm,
    target: FormStatus,
) {
    let action = match (form.status, target) {
        (FormStatus::Draft, _) => "form.publish",
        (FormStatus::Closed, _) => "form.reopen",
        _ => "form.close",
    };
    audit::record(
        storage,
        Some(request),
        NewAuditLog::new(action, "form", Some(form.id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({ "from": form.status, "to": target })),
    )
    .await;
}

pub async fn publish_form(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    transition(service, id, FormStatus::Active, "发布表单", "表单已发布", request).await
}

pub async fn close_form(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    transition(service, id, FormStatus::Closed, "关闭表单", "表单已关闭", request).await
}

pub async fn reopen_form(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    transition(service, id, FormStatus::Active, "重新开放表单", "表单已重新开放", request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn form(status: FormStatus, review_status: ReviewStatus, deadline_in_hours: i64) -> PermissionForm {
        let now = Utc::now();
        PermissionForm {
            id: 1,
            school_id: 1,
            created_by: 2,
            title: "Science fair".to_string(),
            description: None,
            event_date: None,
            event_type: None,
            location: None,
            deadline: now + Duration::hours(deadline_in_hours),
            status,
            review_status,
            review_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            reminder_schedule: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_publish_requires_approval_when_school_reviews() {
        let now = Utc::now();
        let draft = form(FormStatus::Draft, ReviewStatus::Pending, 24);
        assert_eq!(
            check_transition(&draft, FormStatus::Active, true, now).unwrap_err().0,
            ErrorCode::FormReviewRequired
        );
        assert!(check_transition(&draft, FormStatus::Active, false, now).is_ok());

        let approved = form(FormStatus::Draft, ReviewStatus::Approved, 24);
        assert!(check_transition(&approved, FormStatus::Active, true, now).is_ok());
    }

    #[test]
    fn test_publish_and_reopen_need_future_deadline() {
        let now = Utc::now();
        let draft = form(FormStatus::Draft, ReviewStatus::None, -1);
        assert_eq!(
            check_transition(&draft, FormStatus::Active, false, now).unwrap_err().0,
            ErrorCode::FormDeadlineInvalid
        );
        let closed = form(FormStatus::Closed, ReviewStatus::None, -1);
        assert!(check_transition(&closed, FormStatus::Active, false, now).is_err());
        let closed = form(FormStatus::Closed, ReviewStatus::None, 5);
        assert!(check_transition(&closed, FormStatus::Active, false, now).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        let now = Utc::now();
        let draft = form(FormStatus::Draft, ReviewStatus::None, 24);
        assert_eq!(
            check_transition(&draft, FormStatus::Closed, false, now).unwrap_err().0,
            ErrorCode::FormInvalidState
        );
        let active = form(FormStatus::Active, ReviewStatus::None, 24);
        assert!(check_transition(&active, FormStatus::Active, false, now).is_err());
        assert!(check_transition(&active, FormStatus::Closed, false, now).is_ok());
    }
}
