/*!
 * 速率限制中间件
 *
 * 固定窗口计数：已认证请求按用户计，匿名请求按客户端 IP 计。
 * 超过限制返回 429，并带 `Retry-After`。
 *
 * ```rust,ignore
 * web::resource("/magic-link")
 *     .wrap(RateLimit::magic_link())
 *     .route(web::post().to(request_magic_link))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 键: 前缀:标识，值: (窗口开始时间, 计数)
static RATE_LIMIT_CACHE: Lazy<Cache<String, (Instant, u32)>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

/// 速率限制配置
#[derive(Clone)]
pub struct RateLimit {
    /// 时间窗口内允许的最大请求数
    max_requests: u32,
    /// 时间窗口（秒）
    window_secs: u64,
    /// 限制键前缀（用于区分不同端点）
    key_prefix: String,
}

impl RateLimit {
    /// 创建新的速率限制器
    ///
    /// # 参数
    /// - `max_requests`: 时间窗口内允许的最大请求数
    /// - `window_secs`: 时间窗口（秒）
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            key_prefix: String::new(),
        }
    }

    /// 设置限制键前缀
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 密码登录：5次/分钟/IP
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 申请登录链接：3次/10分钟/IP，限制邮件轰炸
    pub fn magic_link() -> Self {
        Self::new(3, 600).with_prefix("magic_link")
    }

    /// 刷新令牌：10次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 手动催签：5次/小时/用户
    pub fn remind() -> Self {
        Self::new(5, 3600).with_prefix("remind")
    }

    /// 附件上传：10次/分钟/用户
    pub fn file_upload() -> Self {
        Self::new(10, 60).with_prefix("upload")
    }

    /// 判断本次请求是否放行，返回剩余次数或需等待的秒数
    async fn hit(&self, key: String, now: Instant) -> Result<u32, u64> {
        let window = Duration::from_secs(self.window_secs);
        let (started, count) = match RATE_LIMIT_CACHE.get(&key).await {
            Some((started, count)) if now.duration_since(started) < window => (started, count),
            _ => (now, 0),
        };

        if count >= self.max_requests {
            let elapsed = now.duration_since(started);
            return Err(window.saturating_sub(elapsed).as_secs().max(1));
        }

        RATE_LIMIT_CACHE.insert(key, (started, count + 1)).await;
        Ok(self.max_requests - count - 1)
    }
}

/// 客户端 IP
///
/// 部署在反向代理后面时依赖代理写入的 X-Forwarded-For / X-Real-IP。
/// 直接暴露在公网时转发头可以伪造。
pub fn extract_client_ip(req: &HttpRequest) -> String {
    // 尝试从连接信息获取真实 IP（最可信）
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    // 如果连接信息有有效 IP，优先使用
    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    // 从 X-Forwarded-For 头获取（用于反向代理场景）
    // 只取第一个 IP（最接近客户端的）
    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    // 从 X-Real-IP 头获取
    if let Some(real_ip) = req.headers().get("X-Real-IP")
        && let Ok(ip) = real_ip.to_str()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    // 如果都没有有效 IP，使用连接信息的默认值
    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

/// 验证 IP 地址格式是否有效
fn is_valid_ip(ip: &str) -> bool {
    use std::net::IpAddr;
    ip.parse::<IpAddr>().is_ok()
}

/// 创建速率限制错误响应
fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let limit = self.limit.clone();

        Box::pin(async move {
            let identifier = req
                .extensions()
                .get::<User>()
                .map(|user| format!("user:{}", user.id))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(req.request())));

            let cache_key = if limit.key_prefix.is_empty() {
                identifier
            } else {
                format!("{}:{}", limit.key_prefix, identifier)
            };

            match limit.hit(cache_key.clone(), Instant::now()).await {
                Ok(remaining) => {
                    req.extensions_mut().insert(RateLimitInfo {
                        remaining,
                        limit: limit.max_requests,
                        reset: limit.window_secs,
                    });
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(retry_after) => {
                    warn!("触发限流: {} (上限 {}/{}s)", cache_key, limit.max_requests, limit.window_secs);
                    Ok(req.into_response(
                        create_rate_limit_response(retry_after).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

/// 速率限制信息（可在响应中添加）
#[derive(Clone)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    pub reset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        let magic = RateLimit::magic_link();
        assert_eq!(magic.max_requests, 3);
        assert_eq!(magic.window_secs, 600);
    }

    #[tokio::test]
    async fn test_window_blocks_then_resets() {
        let limit = RateLimit::new(2, 60).with_prefix("test_window");
        let key = "test_window:ip:10.0.0.1".to_string();
        let start = Instant::now();

        assert_eq!(limit.hit(key.clone(), start).await, Ok(1));
        assert_eq!(limit.hit(key.clone(), start).await, Ok(0));
        assert!(limit.hit(key.clone(), start + Duration::from_secs(10)).await.is_err());

        // 窗口结束后重新计数
        assert_eq!(limit.hit(key, start + Duration::from_secs(61)).await, Ok(1));
    }

    #[test]
    fn test_client_ip_from_forwarded_header() {
        let req = actix_web::test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }
}
