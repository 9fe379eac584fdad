pub mod common;

pub mod audit;
pub mod auth;
pub mod documents;
pub mod forms;
pub mod reminders;
pub mod schools;
pub mod shares;
pub mod students;
pub mod submissions;
pub mod system;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
