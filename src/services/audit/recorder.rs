use actix_web::HttpRequest;
use tracing::warn;

use crate::middlewares::rate_limit::extract_client_ip;
use crate::models::audit::entities::NewAuditLog;
use crate::storage::Storage;

/// 写入审计日志，失败只记录警告，不影响请求结果
pub fn record<'a>(
    storage: &'a dyn Storage,
    request: Option<&HttpRequest>,
    entry: NewAuditLog,
) -> impl Future<Output = ()> + Send + 'a {
    let entry = match request {
        Some(req) => entry.ip(Some(extract_client_ip(req))),
        None => entry,
    };
    async move {
        let action = entry.action.clone();
        if let Err(e) = storage.create_audit_log(entry).await {
            warn!("审计日志 {} 写入失败: {}", action, e);
        }
    }
}
