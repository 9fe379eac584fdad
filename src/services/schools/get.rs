use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SchoolService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, forbidden, not_found, storage_error};

pub async fn get_school(
    service: &SchoolService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    // 非管理员只能查看自己所在的学校
    if !user.can_access_school(id) {
        return Ok(forbidden(ErrorCode::SchoolPermissionDenied, "无权查看该学校"));
    }

    let storage = service.get_storage(request)?;
    match storage.get_school_by_id(id).await {
        Ok(Some(school)) => Ok(HttpResponse::Ok().json(ApiResponse::success(school, "获取学校成功"))),
        Ok(None) => Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => Ok(storage_error("获取学校", e)),
    }
}
