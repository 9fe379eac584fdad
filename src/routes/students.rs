use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{
    CreateStudentRequest, LinkParentRequest, StudentImportQuery, StudentListParams,
    UpdateStudentRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::StudentService;
use crate::utils::{SafeIDI64, SafeParentIdI64};

// 懒加载的全局 StudentService 实例
static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(query.into_inner(), &req).await
}

pub async fn create_student(
    req: HttpRequest,
    student_data: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .create_student(student_data.into_inner(), &req)
        .await
}

pub async fn get_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(student_id.0, &req).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeIDI64,
    update_data: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(student_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.delete_student(student_id.0, &req).await
}

pub async fn link_parent(
    req: HttpRequest,
    student_id: SafeIDI64,
    link_data: web::Json<LinkParentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .link_parent(student_id.0, link_data.into_inner(), &req)
        .await
}

pub async fn unlink_parent(
    req: HttpRequest,
    student_id: SafeIDI64,
    parent_id: SafeParentIdI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .unlink_parent(student_id.0, parent_id.0, &req)
        .await
}

pub async fn import_students(
    req: HttpRequest,
    query: web::Query<StudentImportQuery>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .import_students(query.into_inner().school_id, payload, &req)
        .await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("", web::get().to(list_students))
                    .route("", web::post().to(create_student))
                    .service(
                        web::resource("/import")
                            .wrap(middlewares::RateLimit::file_upload())
                            .route(web::post().to(import_students)),
                    )
                    .route("/{id}", web::get().to(get_student))
                    .route("/{id}", web::put().to(update_student))
                    .route("/{id}", web::delete().to(delete_student))
                    .route("/{id}/parents", web::post().to(link_parent))
                    .route(
                        "/{id}/parents/{parent_id}",
                        web::delete().to(unlink_parent),
                    ),
            ),
    );
}
