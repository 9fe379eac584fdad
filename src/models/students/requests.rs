use crate::models::common::PaginationQuery;
use serde::Deserialize;

// 创建学生请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    /// 仅管理员需要指定，其他角色使用自己所在学校
    pub school_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub grade: String,
    pub group_name: Option<String>,
    pub external_id: Option<String>,
}

// 更新学生请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub grade: Option<String>,
    pub group_name: Option<String>,
    pub external_id: Option<String>,
}

// 学生列表查询参数（HTTP 请求）
#[derive(Debug, Deserialize)]
pub struct StudentListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub school_id: Option<i64>,
    pub grade: Option<String>,
    pub group: Option<String>,
    pub search: Option<String>,
}

// 学生列表查询参数（存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub school_id: Option<i64>,
    pub grade: Option<String>,
    pub group: Option<String>,
    pub search: Option<String>,
}

// 关联家长请求（家长不存在时自动创建）
#[derive(Debug, Clone, Deserialize)]
pub struct LinkParentRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub relationship: Option<String>,
}

// 学生导入查询参数（管理员需指定学校）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentImportQuery {
    pub school_id: Option<i64>,
}
