use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, load_student};
use crate::models::{ApiResponse, students::responses::StudentDetail};
use crate::services::{current_user, storage_error};

pub async fn get_student(
    service: &StudentService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let student = match load_student(storage.as_ref(), &user, id, "获取学生").await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    match storage.list_student_parents(student.id).await {
        Ok(parents) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudentDetail { student, parents },
            "获取学生成功",
        ))),
        Err(e) => Ok(storage_error("获取学生家长", e)),
    }
}
