use serde::Deserialize;

use super::entities::{FieldResponses, SubmissionStatus};
use crate::models::common::PaginationQuery;

/// 签署请求
#[derive(Debug, Clone, Deserialize)]
pub struct SignSubmissionRequest {
    pub signature: String,
    #[serde(default)]
    pub responses: FieldResponses,
}

/// 拒绝请求
#[derive(Debug, Clone, Deserialize)]
pub struct DeclineSubmissionRequest {
    pub reason: Option<String>,
}

/// 提交列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<SubmissionStatus>,
}

/// 家长视角的查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct MySubmissionParams {
    pub status: Option<SubmissionStatus>,
}

// 存储层查询参数
#[derive(Debug, Clone, Default)]
pub struct SubmissionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub form_id: i64,
    pub status: Option<SubmissionStatus>,
}

/// 签署结果写入
#[derive(Debug, Clone)]
pub struct SubmissionDecision {
    pub parent_id: i64,
    pub status: SubmissionStatus,
    pub signature: Option<String>,
    pub decline_reason: Option<String>,
    pub responses: FieldResponses,
}
