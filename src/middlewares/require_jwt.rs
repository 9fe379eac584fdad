/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <access token>`，通过后把当前用户放入请求扩展。
 *
 * ```rust,ignore
 * web::scope("/forms")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_forms))
 * ```
 *
 * 处理函数中用 `RequireJWT::extract_user_claims(&req)` 读取用户。
 * 用户按 ID 缓存 `cache.default_ttl` 秒；停用或删除用户时需清除 `user_cache_key`。
 */


use crate::cache::{CacheResult, ObjectCache, ObjectCacheExt};
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info, warn};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因，决定返回的错误码
enum AuthFailure {
    MissingToken,
    InvalidToken,
    UserUnavailable,
    Internal(&'static str),
}

impl AuthFailure {
    fn into_response(self) -> actix_web::HttpResponse {
        match self {
            AuthFailure::MissingToken => create_error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "缺少或无效的 Authorization 头",
            ),
            AuthFailure::InvalidToken => create_error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "登录已失效，请重新登录",
            ),
            AuthFailure::UserUnavailable => create_error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::AccountDisabled,
                "账号不存在或已停用",
            ),
            AuthFailure::Internal(what) => {
                warn!("JWT 中间件缺少 {}", what);
                create_error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "服务器内部错误",
                )
            }
        }
    }
}

/// 用户缓存键，用户被修改或删除时需要清掉
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// 校验 access token，再按 ID 取用户（优先缓存）
async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req).ok_or(AuthFailure::MissingToken)?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT 校验失败: {}", err);
        AuthFailure::InvalidToken
    })?;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthFailure::InvalidToken)?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(AuthFailure::Internal("cache"))?;

    let key = user_cache_key(user_id);
    if let CacheResult::Found(user) = cache.get_json::<User>(&key).await {
        return if user.is_active() {
            Ok(user)
        } else {
            Err(AuthFailure::UserUnavailable)
        };
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(AuthFailure::Internal("storage"))?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            warn!("认证时读取用户 {} 失败: {}", user_id, e);
            AuthFailure::Internal("user lookup")
        })?
        .ok_or(AuthFailure::UserUnavailable)?;

    if !user.is_active() {
        return Err(AuthFailure::UserUnavailable);
    }

    // password_hash 不参与序列化，缓存中的用户不含密码
    cache.insert_json(key, &user, 0).await;
    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("JWT 认证通过: 用户 {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(failure) => {
                    info!("请求 {} 未通过认证", req.path());
                    Ok(req.into_response(failure.into_response().map_into_right_body()))
                }
            }
        })
    }
}

// 处理函数中读取当前用户
impl RequireJWT {
    /// 当前登录用户，需在 RequireJWT 保护的路由中调用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }

    /// 未认证时的统一响应，供处理函数兜底
    pub fn unauthorized() -> actix_web::HttpResponse {
        actix_web::HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "未登录",
        ))
    }
}
