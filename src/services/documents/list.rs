use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{DocumentService, can_view_documents};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, not_found, storage_error};

pub async fn list_documents(
    service: &DocumentService,
    form_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let form = match storage.get_form_by_id(form_id).await {
        Ok(Some(form)) => form,
        Ok(None) => return Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Ok(storage_error("获取附件列表", e)),
    };
    match can_view_documents(storage.as_ref(), &user, &form).await {
        Ok(true) => {}
        Ok(false) => return Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Ok(storage_error("获取附件列表", e)),
    }

    match storage.list_form_documents(form.id).await {
        Ok(documents) => Ok(HttpResponse::Ok().json(ApiResponse::success(documents, "获取附件列表成功"))),
        Err(e) => Ok(storage_error("获取附件列表", e)),
    }
}
