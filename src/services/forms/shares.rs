//! 表单共享

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    shares::requests::ShareFormRequest,
    users::entities::UserRole,
};
use crate::services::{audit, bad_request, current_user, not_found, storage_error};

pub async fn list_shares(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(resp) = load_form(storage.as_ref(), &actor, id, FormAccess::Manage, "获取共享列表").await {
        return Ok(resp);
    }

    match storage.list_form_shares(id).await {
        Ok(shares) => Ok(HttpResponse::Ok().json(ApiResponse::success(shares, "获取共享列表成功"))),
        Err(e) => Ok(storage_error("获取共享列表", e)),
    }
}

/// 新增或更新共享，目标必须是同校的教师或审核人
pub async fn share_form(
    service: &FormService,
    id: i64,
    share: ShareFormRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Owner, "共享表单").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    let target = match storage.get_user_by_id(share.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(storage_error("共享表单", e)),
    };

    if target.id == form.created_by {
        return Ok(bad_request(ErrorCode::FormShareInvalid, "不能共享给表单创建者"));
    }
    if !matches!(target.role, UserRole::Teacher | UserRole::Reviewer)
        || target.school_id != Some(form.school_id)
    {
        return Ok(bad_request(
            ErrorCode::FormShareInvalid,
            "只能共享给同校的教师或审核人",
        ));
    }

    match storage
        .upsert_form_share(id, target.id, share.permission, actor.id)
        .await
    {
        Ok(saved) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("form.share", "form", Some(id))
                    .school(Some(form.school_id))
                    .actor(actor.id)
                    .details(json!({ "user_id": target.id, "permission": share.permission })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(saved, "共享已保存")))
        }
        Err(e) => Ok(storage_error("共享表单", e)),
    }
}

pub async fn remove_share(
    service: &FormService,
    id: i64,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Owner, "取消共享").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_form_share(id, user_id).await {
        Ok(true) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("form.unshare", "form", Some(id))
                    .school(Some(form.school_id))
                    .actor(actor.id)
                    .details(json!({ "user_id": user_id })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("已取消共享")))
        }
        Ok(false) => Ok(not_found(ErrorCode::NotFound, "共享记录不存在")),
        Err(e) => Ok(storage_error("取消共享", e)),
    }
}
