use serde::Serialize;

use super::entities::{FormField, PermissionForm};
use crate::models::common::PaginatedResponse;
use crate::models::documents::entities::FormDocument;

pub type FormListResponse = PaginatedResponse<PermissionForm>;

/// 签署统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormStats {
    pub total: i64,
    pub pending: i64,
    pub signed: i64,
    pub declined: i64,
    /// 已完成（签署或拒绝）占比，0.0 ~ 1.0
    pub completion_rate: f64,
}

impl FormStats {
    pub fn from_counts(pending: i64, signed: i64, declined: i64) -> Self {
        let total = pending + signed + declined;
        let completion_rate = if total == 0 {
            0.0
        } else {
            (signed + declined) as f64 / total as f64
        };
        Self {
            total,
            pending,
            signed,
            declined,
            completion_rate,
        }
    }
}

/// 表单详情
#[derive(Debug, Serialize)]
pub struct FormDetail {
    pub form: PermissionForm,
    pub fields: Vec<FormField>,
    pub documents: Vec<FormDocument>,
    pub stats: FormStats,
    pub can_manage: bool,
}

/// 分发结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct DistributionResult {
    pub targeted: usize,
    pub created: usize,
    pub already_distributed: usize,
    /// 不存在或不属于该学校的学生 ID
    pub ignored_student_ids: Vec<i64>,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_counts() {
        let stats = FormStats::from_counts(2, 5, 1);
        assert_eq!(stats.total, 8);
        assert!((stats.completion_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_empty_form() {
        let stats = FormStats::from_counts(0, 0, 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }
}
