use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::{LoginRequest, MagicLinkRequest, VerifyMagicLinkRequest};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(
    req: HttpRequest,
    login_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(login_data.into_inner(), &req).await
}

pub async fn request_magic_link(
    req: HttpRequest,
    link_data: web::Json<MagicLinkRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .request_magic_link(link_data.into_inner(), &req)
        .await
}

pub async fn verify_magic_link(
    req: HttpRequest,
    verify_data: web::Json<VerifyMagicLinkRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .verify_magic_link(verify_data.into_inner(), &req)
        .await
}

pub async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

pub async fn logout() -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout().await
}

pub async fn get_user(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_user(&request).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/login")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(login)),
            )
            .service(
                web::resource("/magic-link")
                    .wrap(middlewares::RateLimit::magic_link())
                    .route(web::post().to(request_magic_link)),
            )
            .service(
                web::resource("/magic-link/verify")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(verify_magic_link)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(middlewares::RateLimit::refresh_token())
                    .route(web::post().to(refresh_token)),
            )
            .route("/logout", web::post().to(logout))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/me", web::get().to(get_user)),
            ),
    );
}
