use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{SchoolService, normalize_school_fields};
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, schools::requests::CreateSchoolRequest,
};
use crate::services::{audit, bad_request, conflict, current_user, storage_error};

pub async fn create_school(
    service: &SchoolService,
    mut school: CreateSchoolRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;

    if let Err(msg) = normalize_school_fields(
        Some(&mut school.name),
        Some(&mut school.slug),
        school.reminder_schedule.as_mut(),
    ) {
        return Ok(bad_request(ErrorCode::SchoolSlugInvalid, msg));
    }

    let storage = service.get_storage(request)?;
    match storage.create_school(school).await {
        Ok(school) => {
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("school.create", "school", Some(school.id))
                    .school(Some(school.id))
                    .actor(actor.id)
                    .details(json!({ "name": school.name, "slug": school.slug })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(school, "学校创建成功")))
        }
        Err(e) if e.is_conflict() => Ok(conflict(
            ErrorCode::SchoolAlreadyExists,
            "学校名称或标识已存在",
        )),
        Err(e) => Ok(storage_error("创建学校", e)),
    }
}
