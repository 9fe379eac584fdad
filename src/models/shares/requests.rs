use serde::Deserialize;

use super::entities::SharePermission;

/// 共享表单请求（已存在时更新权限）
#[derive(Debug, Clone, Deserialize)]
pub struct ShareFormRequest {
    pub user_id: i64,
    pub permission: SharePermission,
}
