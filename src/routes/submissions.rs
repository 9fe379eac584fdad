use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{
    DeclineSubmissionRequest, MySubmissionParams, SignSubmissionRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::SubmissionService;
use crate::utils::SafeIDI64;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

pub async fn list_my_submissions(
    req: HttpRequest,
    query: web::Query<MySubmissionParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_my_submissions(query.into_inner(), &req)
        .await
}

pub async fn get_submission(req: HttpRequest, submission_id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_submission(submission_id.0, &req).await
}

pub async fn sign_submission(
    req: HttpRequest,
    submission_id: SafeIDI64,
    sign_data: web::Json<SignSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .sign_submission(submission_id.0, sign_data.into_inner(), &req)
        .await
}

pub async fn decline_submission(
    req: HttpRequest,
    submission_id: SafeIDI64,
    decline_data: web::Json<DeclineSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .decline_submission(submission_id.0, decline_data.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_submission_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/mine")
                    .wrap(middlewares::RequireRole::new_any(UserRole::parent_roles()))
                    .route(web::get().to(list_my_submissions)),
            )
            // 详情对家长和表单读者开放，权限由服务层判断
            .route("/{id}", web::get().to(get_submission))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::parent_roles()))
                    .route("/{id}/sign", web::post().to(sign_submission))
                    .route("/{id}/decline", web::post().to(decline_submission)),
            ),
    );
}
