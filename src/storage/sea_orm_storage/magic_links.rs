//! 登录链接令牌存储

use super::{SeaOrmStorage, write_error};
use crate::entity::magic_link_tokens::{ActiveModel, Column, Entity as MagicLinkTokens};
use crate::errors::{PermissionError, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::Expr};

impl SeaOrmStorage {
    /// 保存令牌哈希
    pub async fn create_magic_link_impl(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let model = ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at.timestamp()),
            used_at: Set(None),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(write_error("保存登录链接失败"))?;

        Ok(())
    }

    /// 消费令牌：未使用且未过期时标记为已使用
    pub async fn consume_magic_link_impl(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        // 条件更新保证并发下只有一次成功
        let result = MagicLinkTokens::update_many()
            .col_expr(Column::UsedAt, Expr::value(now.timestamp()))
            .filter(Column::TokenHash.eq(token_hash))
            .filter(Column::UsedAt.is_null())
            .filter(Column::ExpiresAt.gt(now.timestamp()))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("更新登录链接失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let token = MagicLinkTokens::find()
            .filter(Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询登录链接失败: {e}")))?;

        Ok(token.map(|t| t.user_id))
    }
}
