use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{StudentService, find_or_create_parent, load_student, normalize_optional};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    students::{requests::LinkParentRequest, responses::LinkParentResponse},
};
use crate::services::{audit, current_user, not_found, storage_error};

/// 按邮箱关联家长，家长不存在时在学生所在学校创建
pub async fn link_parent(
    service: &StudentService,
    student_id: i64,
    link: LinkParentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let student = match load_student(storage.as_ref(), &actor, student_id, "关联家长").await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    let (parent, parent_created) = match find_or_create_parent(
        storage.as_ref(),
        student.school_id,
        &link.email,
        link.display_name.as_deref(),
    )
    .await
    {
        Ok(found) => found,
        Err(e) => return Ok(e.into_response("关联家长")),
    };

    let relationship = normalize_optional(link.relationship);
    let linked = match storage
        .link_parent(parent.id, student.id, relationship.clone())
        .await
    {
        Ok(linked) => linked,
        Err(e) => return Ok(storage_error("关联家长", e)),
    };

    if linked {
        audit::record(
            storage.as_ref(),
            Some(request),
            NewAuditLog::new("student.link_parent", "student", Some(student.id))
                .school(Some(student.school_id))
                .actor(actor.id)
                .details(json!({
                    "parent_id": parent.id,
                    "parent_created": parent_created,
                    "relationship": relationship,
                })),
        )
        .await;
    }

    let message = if linked { "家长关联成功" } else { "家长已关联" };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        LinkParentResponse {
            parent,
            parent_created,
            linked,
        },
        message,
    )))
}

pub async fn unlink_parent(
    service: &StudentService,
    student_id: i64,
    parent_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let student = match load_student(storage.as_ref(), &actor, student_id, "取消关联家长").await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    match storage.unlink_parent(parent_id, student.id).await {
        Ok(true) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("student.unlink_parent", "student", Some(student.id))
                    .school(Some(student.school_id))
                    .actor(actor.id)
                    .details(json!({ "parent_id": parent_id })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("已取消关联")))
        }
        Ok(false) => Ok(not_found(ErrorCode::NotFound, "该家长未关联此学生")),
        Err(e) => Ok(storage_error("取消关联家长", e)),
    }
}
