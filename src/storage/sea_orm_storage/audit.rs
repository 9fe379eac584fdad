//! 审计日志存储操作

use super::{SeaOrmStorage, page_params};
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::{PermissionError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    audit::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListQuery,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 写入审计日志
    pub async fn create_audit_log_impl(&self, entry: NewAuditLog) -> Result<AuditLog> {
        let details = match entry.details {
            Some(ref value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        let model = ActiveModel {
            school_id: Set(entry.school_id),
            actor_id: Set(entry.actor_id),
            action: Set(entry.action),
            entity_type: Set(entry.entity_type),
            entity_id: Set(entry.entity_id),
            details: Set(details),
            ip_address: Set(entry.ip_address),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("写入审计日志失败: {e}")))?;

        Ok(result.into_audit_log())
    }

    /// 分页查询审计日志（最新在前）
    pub async fn list_audit_logs_with_pagination_impl(
        &self,
        query: AuditLogListQuery,
    ) -> Result<PaginatedResponse<AuditLog>> {
        let (page, size) = page_params(query.page, query.size);

        let mut select = AuditLogs::find();

        if let Some(school_id) = query.school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }
        if let Some(actor_id) = query.actor_id {
            select = select.filter(Column::ActorId.eq(actor_id));
        }
        if let Some(ref action) = query.action {
            select = select.filter(Column::Action.eq(action.as_str()));
        }
        if let Some(ref entity_type) = query.entity_type {
            select = select.filter(Column::EntityType.eq(entity_type.as_str()));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            PermissionError::database_operation(format!("查询审计日志总数失败: {e}"))
        })?;

        let pages = paginator.num_pages().await.map_err(|e| {
            PermissionError::database_operation(format!("查询审计日志页数失败: {e}"))
        })?;

        let logs = paginator.fetch_page(page - 1).await.map_err(|e| {
            PermissionError::database_operation(format!("查询审计日志失败: {e}"))
        })?;

        Ok(PaginatedResponse {
            items: logs.into_iter().map(|m| m.into_audit_log()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }
}
