use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::{
    ApiResponse, ErrorCode,
    students::requests::{StudentListParams, StudentListQuery},
};
use crate::services::{current_user, forbidden, storage_error};

pub async fn list_students(
    service: &StudentService,
    params: StudentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    // 管理员可按学校过滤，其他角色只能看到自己学校
    let school_id = if user.is_admin() {
        params.school_id
    } else {
        match user.school_id {
            Some(own) if params.school_id.is_none_or(|id| id == own) => Some(own),
            _ => {
                return Ok(forbidden(
                    ErrorCode::SchoolPermissionDenied,
                    "无权查看其他学校的学生",
                ));
            }
        }
    };

    let query = StudentListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        school_id,
        grade: params.grade,
        group: params.group,
        search: params.search,
    };

    let storage = service.get_storage(request)?;
    match storage.list_students_with_pagination(query).await {
        Ok(students) => Ok(HttpResponse::Ok().json(ApiResponse::success(students, "获取学生列表成功"))),
        Err(e) => Ok(storage_error("获取学生列表", e)),
    }
}
