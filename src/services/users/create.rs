use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{UserService, prepare_password};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    users::{entities::UserRole, requests::CreateUserRequest},
};
use crate::services::{audit, bad_request, conflict, current_user, not_found, storage_error};
use crate::utils::validate::{normalize_email, validate_email, validate_required_text};

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;

    user_data.email = normalize_email(&user_data.email);
    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_required_text(&user_data.display_name, "Display name", 100) {
        return Ok(bad_request(ErrorCode::BadRequest, msg));
    }
    user_data.display_name = user_data.display_name.trim().to_string();

    let storage = service.get_storage(request)?;

    // 非管理员必须属于某个学校
    match (user_data.role, user_data.school_id) {
        (UserRole::Admin, _) => {}
        (_, None) => {
            return Ok(bad_request(
                ErrorCode::UserSchoolRequired,
                "非管理员用户必须指定学校",
            ));
        }
        (_, Some(school_id)) => match storage.get_school_by_id(school_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
            Err(e) => return Ok(storage_error("创建用户", e)),
        },
    }

    user_data.password = match prepare_password(user_data.password) {
        Ok(hash) => hash,
        Err(msg) => return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg)),
    };

    match storage.create_user(user_data).await {
        Ok(user) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("user.create", "user", Some(user.id))
                    .school(user.school_id)
                    .actor(actor.id)
                    .details(json!({ "email": user.email, "role": user.role })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "用户创建成功")))
        }
        Err(e) if e.is_conflict() => Ok(conflict(
            ErrorCode::UserEmailAlreadyExists,
            "该邮箱已被使用",
        )),
        Err(e) => Ok(storage_error("创建用户", e)),
    }
}
