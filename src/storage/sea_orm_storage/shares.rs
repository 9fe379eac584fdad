//! 表单共享存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, write_error};
use crate::entity::form_shares::{ActiveModel, Column, Entity as FormShares};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{PermissionError, Result};
use crate::models::shares::entities::{FormShare, FormShareItem, SharePermission};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 新增或更新共享权限
    pub async fn upsert_form_share_impl(
        &self,
        form_id: i64,
        user_id: i64,
        permission: SharePermission,
        shared_by: i64,
    ) -> Result<FormShare> {
        let existing = FormShares::find()
            .filter(Column::FormId.eq(form_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询共享失败: {e}")))?;

        let saved = match existing {
            Some(share) => {
                let mut model: ActiveModel = share.into();
                model.permission = Set(permission.to_string());
                model.shared_by = Set(shared_by);
                model
                    .update(&self.db)
                    .await
                    .map_err(|e| PermissionError::database_operation(format!("更新共享失败: {e}")))?
            }
            None => ActiveModel {
                form_id: Set(form_id),
                user_id: Set(user_id),
                permission: Set(permission.to_string()),
                shared_by: Set(shared_by),
                created_at: Set(chrono::Utc::now().timestamp()),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map_err(write_error("创建共享失败"))?,
        };

        Ok(saved.into_share())
    }

    pub async fn get_form_share_impl(&self, form_id: i64, user_id: i64) -> Result<Option<FormShare>> {
        let result = FormShares::find()
            .filter(Column::FormId.eq(form_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询共享失败: {e}")))?;

        Ok(result.map(|m| m.into_share()))
    }

    /// 共享列表，附带用户信息
    pub async fn list_form_shares_impl(&self, form_id: i64) -> Result<Vec<FormShareItem>> {
        let shares = FormShares::find()
            .filter(Column::FormId.eq(form_id))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询共享失败: {e}")))?;

        if shares.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<i64> = shares.iter().map(|s| s.user_id).collect();
        let users: HashMap<i64, _> = Users::find()
            .filter(UserColumn::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询用户失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(shares
            .into_iter()
            .filter_map(|m| {
                let user = users.get(&m.user_id)?;
                Some(FormShareItem {
                    email: user.email.clone(),
                    display_name: user.display_name.clone(),
                    share: m.into_share(),
                })
            })
            .collect())
    }

    pub async fn delete_form_share_impl(&self, form_id: i64, user_id: i64) -> Result<bool> {
        let result = FormShares::delete_many()
            .filter(Column::FormId.eq(form_id))
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除共享失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
