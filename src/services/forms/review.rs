//! 表单审核

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::{info, warn};

use super::FormService;
use super::access::{FormAccess, load_form};
use super::validation::normalize_text;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::{
        entities::{FormStatus, ReviewStatus},
        requests::ReviewFormRequest,
    },
    users::entities::UserRole,
};
use crate::services::email::{send_all, templates};
use crate::services::{
    audit, bad_request, conflict, current_user, forbidden, not_found, storage_error,
};

/// 提交审核，通知学校的审核人
pub async fn submit_for_review(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Manage, "提交审核").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    if form.status != FormStatus::Draft {
        return Ok(conflict(ErrorCode::FormInvalidState, "只有草稿可以提交审核"));
    }
    if !matches!(form.review_status, ReviewStatus::None | ReviewStatus::Rejected) {
        return Ok(conflict(ErrorCode::FormInvalidState, "表单已在审核中或已通过审核"));
    }
    match storage.get_school_by_id(form.school_id).await {
        Ok(Some(school)) if school.require_form_review => {}
        Ok(Some(_)) => {
            return Ok(conflict(ErrorCode::FormInvalidState, "该学校的表单无需审核"));
        }
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => return Ok(storage_error("提交审核", e)),
    }

    match storage
        .record_form_review(
            id,
            &[ReviewStatus::None, ReviewStatus::Rejected],
            ReviewStatus::Pending,
            None,
            None,
        )
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return Ok(conflict(ErrorCode::FormInvalidState, "表单状态已变化，请刷新后重试"));
        }
        Err(e) => return Ok(storage_error("提交审核", e)),
    }
    let updated = match storage.get_form_by_id(id).await {
        Ok(Some(updated)) => updated,
        Ok(None) => return Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Ok(storage_error("提交审核", e)),
    };

    let reviewers = match storage
        .list_school_users_by_role(form.school_id, UserRole::Reviewer)
        .await
    {
        Ok(reviewers) => reviewers,
        Err(e) => {
            warn!("查询表单 {} 的审核人失败: {}", id, e);
            Vec::new()
        }
    };

    let branding = templates::Branding::from_config();
    let messages: Vec<_> = reviewers
        .iter()
        .map(|r| templates::review_requested(&branding, &r.email, &r.display_name, &updated, &actor.display_name))
        .collect();
    let (sent, failed) = match service.get_email_sender(request) {
        Ok(sender) => send_all(sender.as_ref(), &messages).await,
        Err(_) => (0, messages.len()),
    };
    info!("表单 {} 已提交审核，通知审核人 {} 人，失败 {} 人", id, sent, failed);

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("form.submit_review", "form", Some(id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({ "reviewers_notified": sent, "emails_failed": failed })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "已提交审核")))
}

/// 审核通过或驳回，通知表单创建者
pub async fn review_form(
    service: &FormService,
    id: i64,
    decision: ReviewFormRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let form = match storage.get_form_by_id(id).await {
        Ok(Some(form)) if actor.can_access_school(form.school_id) => form,
        Ok(_) => return Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Ok(storage_error("审核表单", e)),
    };

    if form.created_by == actor.id {
        return Ok(forbidden(ErrorCode::FormPermissionDenied, "不能审核自己创建的表单"));
    }
    if form.review_status != ReviewStatus::Pending {
        return Ok(conflict(ErrorCode::FormInvalidState, "表单不在待审核状态"));
    }

    let comment = match normalize_text(decision.comment, "Comment", 1000) {
        Ok(comment) => comment,
        Err(msg) => return Ok(bad_request(ErrorCode::FormInvalid, msg)),
    };
    let status = if decision.approve {
        ReviewStatus::Approved
    } else {
        ReviewStatus::Rejected
    };

    // 条件写入，并发审核只有一个成功，其余返回 409 且不发邮件
    match storage
        .record_form_review(id, &[ReviewStatus::Pending], status, comment.clone(), Some(actor.id))
        .await
    {
        Ok(true) => {}
        Ok(false) => return Ok(conflict(ErrorCode::FormInvalidState, "表单不在待审核状态")),
        Err(e) => return Ok(storage_error("审核表单", e)),
    }
    let updated = match storage.get_form_by_id(id).await {
        Ok(Some(updated)) => updated,
        Ok(None) => return Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Ok(storage_error("审核表单", e)),
    };

    match storage.get_user_by_id(form.created_by).await {
        Ok(Some(author)) => {
            let message = templates::review_decision(
                &templates::Branding::from_config(),
                &author.email,
                &author.display_name,
                &updated,
                decision.approve,
                comment.as_deref(),
            );
            if let Ok(sender) = service.get_email_sender(request)
                && let Err(e) = sender.send(&message).await
            {
                warn!("发送审核结果邮件失败: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("查询表单 {} 的创建者失败: {}", id, e),
    }

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("form.review", "form", Some(id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({ "status": status, "comment": comment })),
    )
    .await;

    let message = if decision.approve { "表单审核通过" } else { "表单已驳回" };
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, message)))
}
