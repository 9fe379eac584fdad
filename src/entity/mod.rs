//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod audit_logs;
pub mod form_documents;
pub mod form_fields;
pub mod form_shares;
pub mod form_submissions;
pub mod magic_link_tokens;
pub mod parent_students;
pub mod permission_forms;
pub mod reminder_logs;
pub mod schools;
pub mod students;
pub mod users;

use chrono::{DateTime, Utc};

/// 数据库中的秒级时间戳转换为 UTC 时间
pub(crate) fn to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

/// JSON 文本列解析为字符串列表，格式错误时返回空列表
pub(crate) fn parse_string_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
