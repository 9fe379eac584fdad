use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::{
    ApiResponse,
    submissions::requests::{MySubmissionParams, SubmissionListParams, SubmissionListQuery},
};
use crate::services::forms::access::{FormAccess, load_form};
use crate::services::{current_user, storage_error};

pub async fn list_my_submissions(
    service: &SubmissionService,
    params: MySubmissionParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let parent = current_user(request)?;
    let storage = service.get_storage(request)?;

    match storage.list_parent_submissions(parent.id, params.status).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items, "获取提交列表成功"))),
        Err(e) => Ok(storage_error("获取提交列表", e)),
    }
}

pub async fn list_form_submissions(
    service: &SubmissionService,
    form_id: i64,
    params: SubmissionListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(resp) = load_form(storage.as_ref(), &user, form_id, FormAccess::Read, "获取提交列表").await {
        return Ok(resp);
    }

    let query = SubmissionListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        form_id,
        status: params.status,
    };

    match storage.list_submissions_with_pagination(query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取提交列表成功"))),
        Err(e) => Ok(storage_error("获取提交列表", e)),
    }
}
