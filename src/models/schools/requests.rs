use crate::models::common::PaginationQuery;
use serde::Deserialize;

// 创建学校请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSchoolRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub require_form_review: bool,
    pub reminder_schedule: Option<Vec<String>>,
}

// 更新学校请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSchoolRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub require_form_review: Option<bool>,
    pub reminder_schedule: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

// 学校列表查询参数（HTTP 请求）
#[derive(Debug, Deserialize)]
pub struct SchoolListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 学校列表查询参数（存储层）
#[derive(Debug, Clone, Default)]
pub struct SchoolListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
}
