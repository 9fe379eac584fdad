use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use super::{AuthService, issue_session};
use crate::models::{ErrorCode, auth::LoginRequest};
use crate::services::{error_response, storage_error};
use crate::utils::password::verify_password;
use crate::utils::validate::normalize_email;

const INVALID_CREDENTIALS: &str = "邮箱或密码错误";

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if !service.get_config().auth.allow_password_login {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::AuthFailed,
            "已关闭密码登录，请使用登录链接",
        ));
    }

    let storage = service.get_storage(request)?;
    let email = normalize_email(&login_request.email);

    let user = match storage.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(e) => return Ok(storage_error("登录", e)),
    };

    // 未知邮箱和错误密码返回相同结果
    let Some(user) = user.filter(|u| {
        verify_password(&login_request.password, u.password_hash.as_deref())
    }) else {
        tracing::info!("登录失败: {}", email);
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::AuthFailed,
            INVALID_CREDENTIALS,
        ));
    };

    if !user.is_active() {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::AccountDisabled,
            "账号已停用",
        ));
    }

    Ok(issue_session(service, storage.as_ref(), user, login_request.remember_me, "登录成功").await)
}
