use actix_web::{HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::utils::jwt::JwtUtils;

/// 登出：下发过期的 refresh_token cookie
///
/// access token 无状态，客户端丢弃即可；到期前仍然有效。
pub async fn handle_logout() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::success_empty("登出成功")))
}
