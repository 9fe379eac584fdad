use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SchoolService;
use crate::models::{
    ApiResponse,
    schools::requests::{SchoolListParams, SchoolListQuery},
};
use crate::services::storage_error;

pub async fn list_schools(
    service: &SchoolService,
    params: SchoolListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let query = SchoolListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        search: params.search,
    };

    match storage.list_schools_with_pagination(query).await {
        Ok(schools) => Ok(HttpResponse::Ok().json(ApiResponse::success(schools, "获取学校列表成功"))),
        Err(e) => Ok(storage_error("获取学校列表", e)),
    }
}
