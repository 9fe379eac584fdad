use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::models::{ApiResponse, forms::responses::FormDetail};
use crate::services::{current_user, storage_error};

pub async fn get_form(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, access) = match load_form(storage.as_ref(), &user, id, FormAccess::Read, "获取表单").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    let fields = match storage.list_form_fields(id).await {
        Ok(fields) => fields,
        Err(e) => return Ok(storage_error("获取表单字段", e)),
    };
    let documents = match storage.list_form_documents(id).await {
        Ok(documents) => documents,
        Err(e) => return Ok(storage_error("获取表单附件", e)),
    };
    let stats = match storage.get_form_stats(id).await {
        Ok(stats) => stats,
        Err(e) => return Ok(storage_error("获取表单统计", e)),
    };

    let detail = FormDetail {
        form,
        fields,
        documents,
        stats,
        can_manage: access.can_manage(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "获取表单成功")))
}
