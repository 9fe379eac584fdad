use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::SchoolService;
use crate::cache::ObjectCache;
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::{app_state, audit, current_user, not_found, storage_error};

/// 删除学校，级联删除其用户、学生和表单
pub async fn delete_school(
    service: &SchoolService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let school = match storage.get_school_by_id(id).await {
        Ok(Some(school)) => school,
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => return Ok(storage_error("删除学校", e)),
    };

    match storage.delete_school(id).await {
        Ok(true) => {
            // 该校用户已级联删除，认证缓存整体失效
            if let Ok(cache) = app_state::<dyn ObjectCache>(request) {
                cache.invalidate_all().await;
            }
            // 学校已删除，日志不再关联 school_id
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("school.delete", "school", Some(id))
                    .actor(actor.id)
                    .details(json!({ "name": school.name, "slug": school.slug })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("学校已删除")))
        }
        Ok(false) => Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => Ok(storage_error("删除学校", e)),
    }
}
