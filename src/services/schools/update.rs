use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{SchoolService, normalize_school_fields};
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, schools::requests::UpdateSchoolRequest,
};
use crate::services::{audit, bad_request, conflict, current_user, not_found, storage_error};

pub async fn update_school(
    service: &SchoolService,
    id: i64,
    mut update: UpdateSchoolRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;

    if let Err(msg) = normalize_school_fields(
        update.name.as_mut(),
        update.slug.as_mut(),
        update.reminder_schedule.as_mut(),
    ) {
        return Ok(bad_request(ErrorCode::SchoolSlugInvalid, msg));
    }

    let details = json!({
        "name": update.name,
        "slug": update.slug,
        "require_form_review": update.require_form_review,
        "reminder_schedule": update.reminder_schedule,
        "is_active": update.is_active,
    });

    let storage = service.get_storage(request)?;
    match storage.update_school(id, update).await {
        Ok(Some(school)) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("school.update", "school", Some(id))
                    .school(Some(id))
                    .actor(actor.id)
                    .details(details),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(school, "学校更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) if e.is_conflict() => Ok(conflict(
            ErrorCode::SchoolAlreadyExists,
            "学校名称或标识已存在",
        )),
        Err(e) => Ok(storage_error("更新学校", e)),
    }
}
