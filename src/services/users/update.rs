use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{UserService, prepare_password};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    users::{entities::UserRole, requests::UpdateUserRequest},
};
use crate::services::{audit, bad_request, conflict, current_user, not_found, storage_error};
use crate::utils::validate::{normalize_email, validate_email, validate_required_text};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let existing = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(storage_error("更新用户", e)),
    };

    if let Some(email) = update_data.email.as_mut() {
        *email = normalize_email(email);
        if let Err(msg) = validate_email(email) {
            return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
        }
    }
    if let Some(name) = update_data.display_name.as_mut() {
        if let Err(msg) = validate_required_text(name, "Display name", 100) {
            return Ok(bad_request(ErrorCode::BadRequest, msg));
        }
        *name = name.trim().to_string();
    }

    // 修改后的角色与学校组合仍需满足约束
    let role = update_data.role.unwrap_or(existing.role);
    let school_id = update_data.school_id.or(existing.school_id);
    if role != UserRole::Admin && school_id.is_none() {
        return Ok(bad_request(
            ErrorCode::UserSchoolRequired,
            "非管理员用户必须指定学校",
        ));
    }
    if let Some(new_school) = update_data.school_id {
        match storage.get_school_by_id(new_school).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
            Err(e) => return Ok(storage_error("更新用户", e)),
        }
    }

    if user_id == actor.id && (role != existing.role || update_data.status.is_some_and(|s| s != existing.status)) {
        return Ok(bad_request(
            ErrorCode::UserUpdateFailed,
            "不能修改自己的角色或状态",
        ));
    }

    update_data.password = match prepare_password(update_data.password) {
        Ok(hash) => hash,
        Err(msg) => return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg)),
    };

    let changed_fields: Vec<&str> = [
        ("email", update_data.email.is_some()),
        ("display_name", update_data.display_name.is_some()),
        ("password", update_data.password.is_some()),
        ("role", update_data.role.is_some()),
        ("status", update_data.status.is_some()),
        ("school_id", update_data.school_id.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, changed)| changed.then_some(name))
    .collect();

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            service.evict_cached_user(request, user_id).await;
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("user.update", "user", Some(user_id))
                    .school(user.school_id)
                    .actor(actor.id)
                    .details(json!({ "fields": changed_fields })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(user, "用户更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) if e.is_conflict() => Ok(conflict(
            ErrorCode::UserEmailAlreadyExists,
            "该邮箱已被使用",
        )),
        Err(e) => Ok(storage_error("更新用户", e)),
    }
}
