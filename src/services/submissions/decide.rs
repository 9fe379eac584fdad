//! 家长签署或拒绝

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::SubmissionService;
use super::responses::validate_responses;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::entities::PermissionForm,
    students::entities::Student,
    submissions::{
        entities::{FieldResponses, FormSubmission, SubmissionStatus},
        requests::{DeclineSubmissionRequest, SignSubmissionRequest, SubmissionDecision},
    },
    users::entities::User,
};
use crate::services::email::templates;
use crate::services::forms::validation::normalize_text;
use crate::services::{
    audit, bad_request, conflict, current_user, forbidden, not_found, storage_error,
};
use crate::storage::Storage;
use crate::utils::validate::validate_signature;

struct DecisionContext {
    parent: User,
    submission: FormSubmission,
    form: PermissionForm,
    student: Student,
}

/// 签署与拒绝的共同前置条件
async fn load_context(
    storage: &dyn Storage,
    request: &HttpRequest,
    id: i64,
    context: &str,
) -> ActixResult<Result<DecisionContext, HttpResponse>> {
    let parent = current_user(request)?;

    let submission = match storage.get_submission_by_id(id).await {
        Ok(Some(submission)) => submission,
        Ok(None) => return Ok(Err(not_found(ErrorCode::SubmissionNotFound, "提交不存在"))),
        Err(e) => return Ok(Err(storage_error(context, e))),
    };

    match storage.is_parent_of(parent.id, submission.student_id).await {
        Ok(true) => {}
        Ok(false) => {
            return Ok(Err(forbidden(
                ErrorCode::SubmissionPermissionDenied,
                "只有学生的家长可以签署",
            )));
        }
        Err(e) => return Ok(Err(storage_error(context, e))),
    }

    let form = match storage.get_form_by_id(submission.form_id).await {
        Ok(Some(form)) => form,
        Ok(None) => return Ok(Err(not_found(ErrorCode::FormNotFound, "表单不存在"))),
        Err(e) => return Ok(Err(storage_error(context, e))),
    };
    let student = match storage.get_student_by_id(submission.student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(Err(not_found(ErrorCode::StudentNotFound, "学生不存在"))),
        Err(e) => return Ok(Err(storage_error(context, e))),
    };

    if !submission.is_pending() {
        return Ok(Err(conflict(
            ErrorCode::SubmissionAlreadyCompleted,
            "该提交已完成，不能再次修改",
        )));
    }
    if !form.accepts_signatures(Utc::now()) {
        return Ok(Err(conflict(
            ErrorCode::SubmissionDeadlinePassed,
            "表单已关闭或已过截止时间",
        )));
    }

    Ok(Ok(DecisionContext {
        parent,
        submission,
        form,
        student,
    }))
}

/// 条件写入，pending 之外的状态返回 409
async fn record_decision(
    service: &SubmissionService,
    storage: &dyn Storage,
    request: &HttpRequest,
    ctx: &DecisionContext,
    decision: SubmissionDecision,
    context: &str,
) -> ActixResult<HttpResponse> {
    let status = decision.status;
    match storage.record_submission_decision(ctx.submission.id, decision).await {
        Ok(true) => {}
        Ok(false) => {
            return Ok(conflict(
                ErrorCode::SubmissionAlreadyCompleted,
                "该提交已完成，不能再次修改",
            ));
        }
        Err(e) => return Ok(storage_error(context, e)),
    }

    let updated = match storage.get_submission_by_id(ctx.submission.id).await {
        Ok(Some(updated)) => updated,
        Ok(None) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Ok(storage_error(context, e)),
    };

    let branding = templates::Branding::from_config();
    let student_name = ctx.student.full_name();
    let message = match status {
        SubmissionStatus::Signed => templates::signature_confirmation(
            &branding,
            &ctx.parent.email,
            &ctx.parent.display_name,
            &ctx.form,
            &student_name,
        ),
        _ => templates::decline_confirmation(
            &branding,
            &ctx.parent.email,
            &ctx.parent.display_name,
            &ctx.form,
            &student_name,
            updated.decline_reason.as_deref(),
        ),
    };
    match service.get_email_sender(request) {
        Ok(sender) => {
            if let Err(e) = sender.send(&message).await {
                warn!("发送确认邮件给 {} 失败: {}", ctx.parent.email, e);
            }
        }
        Err(_) => warn!("邮件发送器不可用，跳过确认邮件"),
    }

    let action = if status == SubmissionStatus::Signed {
        "submission.sign"
    } else {
        "submission.decline"
    };
    audit::record(
        storage,
        Some(request),
        NewAuditLog::new(action, "submission", Some(updated.id))
            .school(Some(ctx.form.school_id))
            .actor(ctx.parent.id)
            .details(json!({ "form_id": ctx.form.id, "student_id": ctx.student.id })),
    )
    .await;

    let msg = if status == SubmissionStatus::Signed { "签署成功" } else { "已拒绝" };
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, msg)))
}

pub async fn sign_submission(
    service: &SubmissionService,
    id: i64,
    sign: SignSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let ctx = match load_context(storage.as_ref(), request, id, "签署").await? {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_signature(&sign.signature) {
        return Ok(bad_request(ErrorCode::SubmissionSignatureInvalid, msg));
    }

    let fields = match storage.list_form_fields(ctx.form.id).await {
        Ok(fields) => fields,
        Err(e) => return Ok(storage_error("签署", e)),
    };
    let responses = match validate_responses(&fields, &sign.responses) {
        Ok(responses) => responses,
        Err(msg) => return Ok(bad_request(ErrorCode::SubmissionResponsesInvalid, msg)),
    };

    let decision = SubmissionDecision {
        parent_id: ctx.parent.id,
        status: SubmissionStatus::Signed,
        signature: Some(sign.signature.trim().to_string()),
        decline_reason: None,
        responses,
    };
    record_decision(service, storage.as_ref(), request, &ctx, decision, "签署").await
}

pub async fn decline_submission(
    service: &SubmissionService,
    id: i64,
    decline: DeclineSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let ctx = match load_context(storage.as_ref(), request, id, "拒绝签署").await? {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    let reason = match normalize_text(decline.reason, "Reason", 1000) {
        Ok(reason) => reason,
        Err(msg) => return Ok(bad_request(ErrorCode::BadRequest, msg)),
    };

    let decision = SubmissionDecision {
        parent_id: ctx.parent.id,
        status: SubmissionStatus::Declined,
        signature: None,
        decline_reason: reason,
        responses: FieldResponses::new(),
    };
    record_decision(service, storage.as_ref(), request, &ctx, decision, "拒绝签署").await
}
