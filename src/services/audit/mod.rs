pub mod list;
pub mod recorder;

pub use recorder::record;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::audit::requests::AuditLogListParams;
use crate::storage::Storage;

pub struct AuditService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuditService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::app_state::<dyn Storage>(request),
        }
    }

    // 审计日志列表
    pub async fn list_audit_logs(
        &self,
        params: AuditLogListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_audit_logs(self, params, request).await
    }
}
