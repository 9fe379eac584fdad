use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{StudentService, load_student};
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::{audit, current_user, not_found, storage_error};

pub async fn delete_student(
    service: &StudentService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let student = match load_student(storage.as_ref(), &actor, id, "删除学生").await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_student(id).await {
        Ok(true) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("student.delete", "student", Some(id))
                    .school(Some(student.school_id))
                    .actor(actor.id)
                    .details(json!({ "name": student.full_name() })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("学生删除成功")))
        }
        Ok(false) => Ok(not_found(ErrorCode::StudentNotFound, "学生不存在")),
        Err(e) => Ok(storage_error("删除学生", e)),
    }
}
