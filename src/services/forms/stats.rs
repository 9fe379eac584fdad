use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::models::ApiResponse;
use crate::services::{current_user, storage_error};

pub async fn get_form_stats(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(resp) = load_form(storage.as_ref(), &user, id, FormAccess::Read, "获取表单统计").await {
        return Ok(resp);
    }

    match storage.get_form_stats(id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats, "获取表单统计成功"))),
        Err(e) => Ok(storage_error("获取表单统计", e)),
    }
}
