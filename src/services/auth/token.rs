use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use super::AuthService;
use crate::models::auth::responses::{RefreshTokenResponse, UserInfoResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response, storage_error};
use crate::utils::jwt::JwtUtils;

fn expired_session() -> HttpResponse {
    // 清掉失效的 refresh cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "登录已过期，请重新登录",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "未登录",
        ));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!("refresh token 校验失败: {}", e);
            return Ok(expired_session());
        }
    };
    let Ok(user_id) = claims.sub.parse::<i64>() else {
        return Ok(expired_session());
    };

    // 角色和状态以数据库为准
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => return Ok(expired_session()),
        Err(e) => return Ok(storage_error("刷新令牌", e)),
    };

    match JwtUtils::generate_access_token(user.id, user.role.as_str()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: service.get_config().jwt.access_token_expiry * 60,
            },
            "令牌已刷新",
        ))),
        Err(e) => {
            tracing::error!("签发 access token 失败: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "刷新令牌失败",
            ))
        }
    }
}

pub async fn handle_get_user(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user },
        "获取用户信息成功",
    )))
}
