use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{StudentService, load_student, normalize_optional, normalize_student_name};
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, students::requests::UpdateStudentRequest,
};
use crate::services::{audit, bad_request, conflict, current_user, not_found, storage_error};

pub async fn update_student(
    service: &StudentService,
    id: i64,
    mut update: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let existing = match load_student(storage.as_ref(), &actor, id, "更新学生").await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    for (value, field) in [
        (update.first_name.as_mut(), "First name"),
        (update.last_name.as_mut(), "Last name"),
        (update.grade.as_mut(), "Grade"),
    ] {
        if let Some(value) = value
            && let Err(msg) = normalize_student_name(value, field)
        {
            return Ok(bad_request(ErrorCode::StudentInvalid, msg));
        }
    }
    // 传入空串表示清空
    update.group_name = update.group_name.map(|g| g.trim().to_string());
    update.external_id = update.external_id.map(|e| e.trim().to_string());

    if let Some(external_id) = normalize_optional(update.external_id.clone()) {
        match storage
            .get_student_by_external_id(existing.school_id, &external_id)
            .await
        {
            Ok(Some(other)) if other.id != id => {
                return Ok(conflict(ErrorCode::StudentInvalid, "外部编号已被其他学生使用"));
            }
            Ok(_) => {}
            Err(e) => return Ok(storage_error("更新学生", e)),
        }
    }

    let changed_fields: Vec<&str> = [
        ("first_name", update.first_name.is_some()),
        ("last_name", update.last_name.is_some()),
        ("grade", update.grade.is_some()),
        ("group_name", update.group_name.is_some()),
        ("external_id", update.external_id.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, changed)| changed.then_some(name))
    .collect();

    match storage.update_student(id, update).await {
        Ok(Some(student)) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("student.update", "student", Some(id))
                    .school(Some(student.school_id))
                    .actor(actor.id)
                    .details(json!({ "fields": changed_fields })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(student, "学生更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "学生不存在")),
        Err(e) => Ok(storage_error("更新学生", e)),
    }
}
