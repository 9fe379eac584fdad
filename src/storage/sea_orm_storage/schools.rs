//! 学校存储操作

use super::{SeaOrmStorage, page_params, write_error};
use crate::entity::schools::{ActiveModel, Column, Entity as Schools};
use crate::errors::{PermissionError, Result};
use crate::models::{
    PaginationInfo,
    schools::{
        entities::School,
        requests::{CreateSchoolRequest, SchoolListQuery, UpdateSchoolRequest},
        responses::SchoolListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

fn encode_schedule(schedule: &[String]) -> Result<String> {
    Ok(serde_json::to_string(schedule)?)
}

impl SeaOrmStorage {
    /// 创建学校
    pub async fn create_school_impl(&self, req: CreateSchoolRequest) -> Result<School> {
        let now = chrono::Utc::now().timestamp();

        let schedule = match req.reminder_schedule {
            Some(ref schedule) => Some(encode_schedule(schedule)?),
            None => None,
        };

        let model = ActiveModel {
            name: Set(req.name),
            slug: Set(req.slug),
            require_form_review: Set(req.require_form_review),
            reminder_schedule: Set(schedule),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(write_error("创建学校失败"))?;

        Ok(result.into_school())
    }

    /// 通过 ID 获取学校
    pub async fn get_school_by_id_impl(&self, id: i64) -> Result<Option<School>> {
        let result = Schools::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学校失败: {e}")))?;

        Ok(result.map(|m| m.into_school()))
    }

    /// 分页列出学校
    pub async fn list_schools_with_pagination_impl(
        &self,
        query: SchoolListQuery,
    ) -> Result<SchoolListResponse> {
        let (page, size) = page_params(query.page, query.size);

        let mut select = Schools::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Slug.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::Name);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学校总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学校页数失败: {e}")))?;

        let schools = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学校列表失败: {e}")))?;

        Ok(SchoolListResponse {
            items: schools.into_iter().map(|m| m.into_school()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新学校
    pub async fn update_school_impl(
        &self,
        id: i64,
        update: UpdateSchoolRequest,
    ) -> Result<Option<School>> {
        if self.get_school_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(slug) = update.slug {
            model.slug = Set(slug);
        }
        if let Some(require_form_review) = update.require_form_review {
            model.require_form_review = Set(require_form_review);
        }
        if let Some(schedule) = update.reminder_schedule {
            // 空列表表示恢复系统默认
            model.reminder_schedule = Set(if schedule.is_empty() {
                None
            } else {
                Some(encode_schedule(&schedule)?)
            });
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(write_error("更新学校失败"))?;

        self.get_school_by_id_impl(id).await
    }

    /// 删除学校（级联删除用户、学生和表单）
    pub async fn delete_school_impl(&self, id: i64) -> Result<bool> {
        let result = Schools::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除学校失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
