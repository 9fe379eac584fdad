//! 定时任务入口校验
//!
//! 外部调度器调用 `/api/v1/cron/*` 时需携带 `Authorization: Bearer <reminders.cron_secret>`。
//! 未配置密钥时拒绝所有调用。

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::warn;

use crate::config::AppConfig;
use crate::models::ErrorCode;

use super::create_error_response;

#[derive(Clone, Default)]
pub struct RequireCronSecret {
    // 测试时注入，None 时读取全局配置
    secret: Option<String>,
}

impl RequireCronSecret {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }
}

/// 逐字节比较，耗时与内容无关
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn authorized(header: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_eq(token.trim().as_bytes(), secret.as_bytes()))
}

impl<S, B> Transform<S, ServiceRequest> for RequireCronSecret
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireCronSecretMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireCronSecretMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct RequireCronSecretMiddleware<S> {
    service: Rc<S>,
    secret: Option<String>,
}

impl<S, B> Service<ServiceRequest> for RequireCronSecretMiddleware<S>
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
        let secret = self
            .secret
            .clone()
            .unwrap_or_else(|| AppConfig::get().reminders.cron_secret.clone());

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok());

            if !authorized(header, &secret) {
                if secret.is_empty() {
                    warn!("未配置 reminders.cron_secret, 拒绝定时任务调用 {}", req.path());
                } else {
                    warn!("定时任务密钥校验失败: {}", req.path());
                }
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::CronSecretInvalid,
                        "定时任务密钥无效",
                    )
                    .map_into_right_body(),
                ));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    #[::core::prelude::v1::test]
    fn test_authorized_requires_exact_secret() {
        assert!(authorized(Some("Bearer s3cret"), "s3cret"));
        assert!(!authorized(Some("Bearer s3cre"), "s3cret"));
        assert!(!authorized(Some("s3cret"), "s3cret"));
        assert!(!authorized(None, "s3cret"));
    }

    #[::core::prelude::v1::test]
    fn test_empty_secret_refuses_everything() {
        assert!(!authorized(Some("Bearer "), ""));
        assert!(!authorized(None, ""));
    }

    #[actix_web::test]
    async fn test_middleware_rejects_wrong_secret() {
        let app = test::init_service(
            App::new().service(
                web::scope("/cron")
                    .wrap(RequireCronSecret::with_secret("abc"))
                    .route("/run", web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let denied = test::TestRequest::post()
            .uri("/cron/run")
            .insert_header(("Authorization", "Bearer nope"))
            .to_request();
        let resp = test::call_service(&app, denied).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let allowed = test::TestRequest::post()
            .uri("/cron/run")
            .insert_header(("Authorization", "Bearer abc"))
            .to_request();
        let resp = test::call_service(&app, allowed).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
