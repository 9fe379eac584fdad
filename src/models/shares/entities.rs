use serde::{Deserialize, Serialize};

use crate::define_string_enum;

define_string_enum! {
    /// 共享权限
    pub enum SharePermission {
        View => "view",
        Edit => "edit",
    }
}

// 表单共享记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormShare {
    pub id: i64,
    pub form_id: i64,
    pub user_id: i64,
    pub permission: SharePermission,
    pub shared_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 共享列表项，附带被共享用户信息
#[derive(Debug, Clone, Serialize)]
pub struct FormShareItem {
    #[serde(flatten)]
    pub share: FormShare,
    pub email: String,
    pub display_name: String,
}
