use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FormService;
use crate::models::{
    ApiResponse, ErrorCode,
    forms::requests::{FormListParams, FormListQuery},
    users::entities::UserRole,
};
use crate::services::{current_user, forbidden, storage_error};

pub async fn list_forms(
    service: &FormService,
    params: FormListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    // 管理员看全部；审核人看本校全部；教师只看自己创建或被共享的
    let (school_id, visible_to) = match (user.role, user.school_id) {
        (UserRole::Admin, _) => (params.school_id, None),
        (UserRole::Reviewer, Some(own)) => (Some(own), None),
        (UserRole::Teacher, Some(own)) => (Some(own), Some(user.id)),
        _ => return Ok(forbidden(ErrorCode::FormPermissionDenied, "无权查看表单列表")),
    };

    let query = FormListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        status: params.status,
        review_status: params.review_status,
        school_id,
        visible_to,
        search: params.search,
    };

    let storage = service.get_storage(request)?;
    match storage.list_forms_with_pagination(query).await {
        Ok(forms) => Ok(HttpResponse::Ok().json(ApiResponse::success(forms, "获取表单列表成功"))),
        Err(e) => Ok(storage_error("获取表单列表", e)),
    }
}
