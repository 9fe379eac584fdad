use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;
use tracing::warn;

use super::SystemService;
use crate::models::{ApiResponse, AppStartTime, system::responses::HealthResponse};

/// 数据库不可用时返回 503，响应体仍包含版本与运行时间
pub async fn handle_health(
    service: &SystemService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let database = match storage.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("健康检查时数据库不可用: {}", e);
            false
        }
    };

    let now = Utc::now();
    let started_at = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|t| t.start_datetime)
        .unwrap_or(now);

    let response = HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: now.signed_duration_since(started_at).num_seconds(),
        started_at,
    };

    if database {
        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "服务运行正常")))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::success(response, "数据库不可用")))
    }
}
