use serde::Serialize;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
    pub uptime_secs: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
