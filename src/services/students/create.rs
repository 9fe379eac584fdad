use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{StudentService, normalize_optional, normalize_student_name};
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, students::requests::CreateStudentRequest,
};
use crate::services::{
    audit, bad_request, conflict, current_user, not_found, storage_error, target_school,
};

pub async fn create_student(
    service: &StudentService,
    mut student: CreateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;

    let school_id = match target_school(&actor, student.school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    for (value, field) in [
        (&mut student.first_name, "First name"),
        (&mut student.last_name, "Last name"),
        (&mut student.grade, "Grade"),
    ] {
        if let Err(msg) = normalize_student_name(value, field) {
            return Ok(bad_request(ErrorCode::StudentInvalid, msg));
        }
    }
    student.group_name = normalize_optional(student.group_name);
    student.external_id = normalize_optional(student.external_id);

    let storage = service.get_storage(request)?;
    match storage.get_school_by_id(school_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => return Ok(storage_error("创建学生", e)),
    }

    // 外部编号在学校内唯一
    if let Some(external_id) = student.external_id.as_deref() {
        match storage.get_student_by_external_id(school_id, external_id).await {
            Ok(Some(_)) => {
                return Ok(conflict(ErrorCode::StudentInvalid, "外部编号已被其他学生使用"));
            }
            Ok(None) => {}
            Err(e) => return Ok(storage_error("创建学生", e)),
        }
    }

    match storage.create_student(school_id, student).await {
        Ok(student) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("student.create", "student", Some(student.id))
                    .school(Some(school_id))
                    .actor(actor.id)
                    .details(json!({ "name": student.full_name(), "grade": student.grade })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(student, "学生创建成功")))
        }
        Err(e) => Ok(storage_error("创建学生", e)),
    }
}
