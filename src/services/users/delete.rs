use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::UserService;
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::{audit, bad_request, current_user, not_found, storage_error};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;

    if user_id == actor.id {
        return Ok(bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "不能删除当前登录的用户",
        ));
    }

    let storage = service.get_storage(request)?;

    let target = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(storage_error("删除用户", e)),
    };

    match storage.delete_user(user_id).await {
        Ok(true) => {
            service.evict_cached_user(request, user_id).await;
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("user.delete", "user", Some(user_id))
                    .school(target.school_id)
                    .actor(actor.id)
                    .details(json!({ "email": target.email, "role": target.role })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("用户已删除")))
        }
        Ok(false) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(storage_error("删除用户", e)),
    }
}
