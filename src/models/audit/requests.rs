use serde::Deserialize;

use crate::models::common::PaginationQuery;

/// 审计日志查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
}

// 存储层查询参数
#[derive(Debug, Clone, Default)]
pub struct AuditLogListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
}
