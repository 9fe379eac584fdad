use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AuditService;
use crate::models::{
    ApiResponse,
    audit::requests::{AuditLogListParams, AuditLogListQuery},
};
use crate::services::storage_error;

pub async fn list_audit_logs(
    service: &AuditService,
    params: AuditLogListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let query = AuditLogListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        school_id: params.school_id,
        actor_id: params.actor_id,
        action: params.action.filter(|s| !s.trim().is_empty()),
        entity_type: params.entity_type.filter(|s| !s.trim().is_empty()),
    };

    match storage.list_audit_logs_with_pagination(query).await {
        Ok(logs) => Ok(HttpResponse::Ok().json(ApiResponse::success(logs, "获取审计日志成功"))),
        Err(e) => Ok(storage_error("获取审计日志", e)),
    }
}
