use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::forms::requests::{
    CreateFormRequest, DistributeFormRequest, FormListParams, ReviewFormRequest, UpdateFormRequest,
};
use crate::models::shares::requests::ShareFormRequest;
use crate::models::submissions::requests::SubmissionListParams;
use crate::models::users::entities::UserRole;
use crate::services::{DocumentService, FormService, ReminderService, SubmissionService};
use crate::utils::{SafeDocumentIdI64, SafeIDI64, SafeUserIdI64};

// 懒加载的全局服务实例
static FORM_SERVICE: Lazy<FormService> = Lazy::new(FormService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);
static DOCUMENT_SERVICE: Lazy<DocumentService> = Lazy::new(DocumentService::new_lazy);
static REMINDER_SERVICE: Lazy<ReminderService> = Lazy::new(ReminderService::new_lazy);

pub async fn list_forms(
    req: HttpRequest,
    query: web::Query<FormListParams>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE.list_forms(query.into_inner(), &req).await
}

pub async fn create_form(
    req: HttpRequest,
    form_data: web::Json<CreateFormRequest>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE.create_form(form_data.into_inner(), &req).await
}

pub async fn get_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.get_form(form_id.0, &req).await
}

pub async fn update_form(
    req: HttpRequest,
    form_id: SafeIDI64,
    update_data: web::Json<UpdateFormRequest>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE
        .update_form(form_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.delete_form(form_id.0, &req).await
}

pub async fn publish_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.publish_form(form_id.0, &req).await
}

pub async fn close_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.close_form(form_id.0, &req).await
}

pub async fn reopen_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.reopen_form(form_id.0, &req).await
}

pub async fn submit_for_review(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.submit_for_review(form_id.0, &req).await
}

pub async fn review_form(
    req: HttpRequest,
    form_id: SafeIDI64,
    decision: web::Json<ReviewFormRequest>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE
        .review_form(form_id.0, decision.into_inner(), &req)
        .await
}

pub async fn get_form_stats(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.get_form_stats(form_id.0, &req).await
}

pub async fn export_submissions(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.export_submissions(form_id.0, &req).await
}

pub async fn list_shares(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FORM_SERVICE.list_shares(form_id.0, &req).await
}

pub async fn share_form(
    req: HttpRequest,
    form_id: SafeIDI64,
    share_data: web::Json<ShareFormRequest>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE
        .share_form(form_id.0, share_data.into_inner(), &req)
        .await
}

pub async fn remove_share(
    req: HttpRequest,
    form_id: SafeIDI64,
    user_id: SafeUserIdI64,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE.remove_share(form_id.0, user_id.0, &req).await
}

pub async fn distribute_form(
    req: HttpRequest,
    form_id: SafeIDI64,
    targets: web::Json<DistributeFormRequest>,
) -> ActixResult<HttpResponse> {
    FORM_SERVICE
        .distribute_form(form_id.0, targets.into_inner(), &req)
        .await
}

pub async fn remind_form(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    REMINDER_SERVICE.remind_form(form_id.0, &req).await
}

pub async fn list_form_submissions(
    req: HttpRequest,
    form_id: SafeIDI64,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_form_submissions(form_id.0, query.into_inner(), &req)
        .await
}

pub async fn list_documents(req: HttpRequest, form_id: SafeIDI64) -> ActixResult<HttpResponse> {
    DOCUMENT_SERVICE.list_documents(form_id.0, &req).await
}

pub async fn upload_document(
    req: HttpRequest,
    form_id: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    DOCUMENT_SERVICE
        .upload_document(form_id.0, payload, &req)
        .await
}

pub async fn delete_document(
    req: HttpRequest,
    form_id: SafeIDI64,
    document_id: SafeDocumentIdI64,
) -> ActixResult<HttpResponse> {
    DOCUMENT_SERVICE
        .delete_document(form_id.0, document_id.0, &req)
        .await
}

// 配置路由
pub fn configure_form_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/forms")
            .wrap(middlewares::RequireJWT)
            // 家长也可以查看自己学生相关表单的附件
            .route("/{id}/documents", web::get().to(list_documents))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
                    .route("", web::get().to(list_forms))
                    .service(
                        web::resource("")
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                            .route(web::post().to(create_form)),
                    )
                    .route("/{id}", web::get().to(get_form))
                    .route("/{id}", web::put().to(update_form))
                    .route("/{id}", web::delete().to(delete_form))
                    .route("/{id}/publish", web::post().to(publish_form))
                    .route("/{id}/close", web::post().to(close_form))
                    .route("/{id}/reopen", web::post().to(reopen_form))
                    .route("/{id}/submit-review", web::post().to(submit_for_review))
                    .service(
                        web::resource("/{id}/review")
                            .wrap(middlewares::RequireRole::new_any(UserRole::reviewer_roles()))
                            .route(web::post().to(review_form)),
                    )
                    .route("/{id}/stats", web::get().to(get_form_stats))
                    .route("/{id}/export", web::get().to(export_submissions))
                    .route("/{id}/submissions", web::get().to(list_form_submissions))
                    .route("/{id}/shares", web::get().to(list_shares))
                    .route("/{id}/shares", web::put().to(share_form))
                    .route("/{id}/shares/{user_id}", web::delete().to(remove_share))
                    .route("/{id}/distribute", web::post().to(distribute_form))
                    .service(
                        web::resource("/{id}/remind")
                            .wrap(middlewares::RateLimit::remind())
                            .route(web::post().to(remind_form)),
                    )
                    .service(
                        web::resource("/{id}/documents")
                            .wrap(middlewares::RateLimit::file_upload())
                            .route(web::post().to(upload_document)),
                    )
                    .route(
                        "/{id}/documents/{document_id}",
                        web::delete().to(delete_document),
                    ),
            ),
    );
}
