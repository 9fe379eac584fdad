pub mod login;
pub mod logout;
pub mod magic_link;
pub mod token;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::error;

use crate::config::AppConfig;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse, MagicLinkRequest, VerifyMagicLinkRequest},
    users::entities::User,
};
use crate::services::{EmailSender, app_state, error_response};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => app_state::<dyn Storage>(request),
        }
    }

    pub(crate) fn get_email_sender(
        &self,
        request: &HttpRequest,
    ) -> ActixResult<Arc<dyn EmailSender>> {
        app_state::<dyn EmailSender>(request)
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 邮箱密码登录
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 申请登录链接
    pub async fn request_magic_link(
        &self,
        link_request: MagicLinkRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        magic_link::handle_request_magic_link(self, link_request, request).await
    }

    // 使用登录链接登录
    pub async fn verify_magic_link(
        &self,
        verify_request: VerifyMagicLinkRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        magic_link::handle_verify_magic_link(self, verify_request, request).await
    }

    // 登出
    pub async fn logout(&self) -> ActixResult<HttpResponse> {
        logout::handle_logout().await
    }

    // 刷新令牌
    pub async fn refresh_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_refresh_token(self, request).await
    }

    // 当前用户信息
    pub async fn get_user(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_get_user(self, request).await
    }
}

/// 签发令牌对并写入 refresh cookie，密码登录和登录链接共用
pub(crate) async fn issue_session(
    service: &AuthService,
    storage: &dyn Storage,
    user: User,
    remember_me: bool,
    message: &str,
) -> HttpResponse {
    let config = service.get_config();
    let days = JwtUtils::refresh_token_days(remember_me);

    let token_pair = match user.generate_token_pair(Some(chrono::Duration::days(days))) {
        Ok(pair) => pair,
        Err(e) => {
            error!("签发令牌失败: {}", e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "登录失败，无法生成令牌",
            );
        }
    };

    if let Err(e) = storage.update_last_login(user.id).await {
        error!("更新用户 {} 最后登录时间失败: {}", user.id, e);
    }

    tracing::info!("用户 {} 登录成功", user.id);

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: config.jwt.access_token_expiry * 60,
        user,
        created_at: chrono::Utc::now(),
    };

    HttpResponse::Ok()
        .cookie(JwtUtils::create_refresh_token_cookie(
            &token_pair.refresh_token,
            days,
        ))
        .json(ApiResponse::success(response, message))
}
