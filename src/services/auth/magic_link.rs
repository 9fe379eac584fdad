use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use super::{AuthService, issue_session};
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{MagicLinkRequest, VerifyMagicLinkRequest},
};
use crate::services::email::templates::{self, Branding};
use crate::services::{error_response, storage_error};
use crate::utils::token::{generate_token, hash_token};
use crate::utils::validate::{normalize_email, validate_email};

const LINK_SENT: &str = "如果该邮箱已注册，登录链接已发送";

/// 无论邮箱是否存在都返回 200，避免泄露账号信息
pub async fn handle_request_magic_link(
    service: &AuthService,
    link_request: MagicLinkRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let email = normalize_email(&link_request.email);
    if validate_email(&email).is_err() {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::UserEmailInvalid,
            "邮箱格式无效",
        ));
    }

    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_email(&email).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => {
            info!("登录链接申请的邮箱不存在或已停用: {}", email);
            return Ok(HttpResponse::Ok().json(ApiResponse::success_empty(LINK_SENT)));
        }
        Err(e) => return Ok(storage_error("申请登录链接", e)),
    };

    let expiry_minutes = service.get_config().auth.magic_link_expiry.max(1);
    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(expiry_minutes);

    if let Err(e) = storage
        .create_magic_link(user.id, &hash_token(&token), expires_at)
        .await
    {
        return Ok(storage_error("申请登录链接", e));
    }

    let message = templates::magic_link(
        &Branding::from_config(),
        &user.email,
        &user.display_name,
        &token,
        expiry_minutes,
    );
    let sender = service.get_email_sender(request)?;
    if let Err(e) = sender.send(&message).await {
        warn!("登录链接邮件发送失败 {}: {}", user.email, e);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty(LINK_SENT)))
}

pub async fn handle_verify_magic_link(
    service: &AuthService,
    verify_request: VerifyMagicLinkRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let invalid = || {
        error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::MagicLinkInvalid,
            "登录链接无效或已过期",
        )
    };

    let token = verify_request.token.trim();
    if token.is_empty() {
        return Ok(invalid());
    }

    let storage = service.get_storage(request)?;

    // 条件更新保证令牌只能使用一次
    let user_id = match storage.consume_magic_link(&hash_token(token), Utc::now()).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Ok(invalid()),
        Err(e) => return Ok(storage_error("验证登录链接", e)),
    };

    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(invalid()),
        Err(e) => return Ok(storage_error("验证登录链接", e)),
    };

    if !user.is_active() {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::AccountDisabled,
            "账号已停用",
        ));
    }

    Ok(issue_session(
        service,
        storage.as_ref(),
        user,
        verify_request.remember_me,
        "登录成功",
    )
    .await)
}
