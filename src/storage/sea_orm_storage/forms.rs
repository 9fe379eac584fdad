//! 表单存储操作

use super::{SeaOrmStorage, page_params, write_error};
use crate::entity::form_fields::{
    ActiveModel as FieldActiveModel, Column as FieldColumn, Entity as FormFields,
};
use crate::entity::form_shares::{Column as ShareColumn, Entity as FormShares};
use crate::entity::permission_forms::{ActiveModel, Column, Entity as PermissionForms};
use crate::errors::{PermissionError, Result};
use crate::models::{
    PaginationInfo,
    forms::{
        entities::{FormField, FormStatus, PermissionForm, ReviewStatus},
        requests::{FormChanges, FormFieldInput, FormListQuery, NewPermissionForm},
        responses::FormListResponse,
    },
};
use crate::utils::escape_like_pattern;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};

/// 写入字段定义（按顺序编号）
async fn insert_fields<C: ConnectionTrait>(
    conn: &C,
    form_id: i64,
    fields: Vec<FormFieldInput>,
) -> Result<()> {
    for (position, field) in fields.into_iter().enumerate() {
        let options = if field.options.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&field.options)?)
        };

        FieldActiveModel {
            form_id: Set(form_id),
            label: Set(field.label),
            field_type: Set(field.field_type.to_string()),
            required: Set(field.required),
            options: Set(options),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| PermissionError::database_operation(format!("创建表单字段失败: {e}")))?;
    }
    Ok(())
}

impl SeaOrmStorage {
    /// 创建表单及其字段
    pub async fn create_form_impl(&self, form: NewPermissionForm) -> Result<PermissionForm> {
        let now = Utc::now().timestamp();
        let schedule = serde_json::to_string(&form.reminder_schedule)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PermissionError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            school_id: Set(form.school_id),
            created_by: Set(form.created_by),
            title: Set(form.title),
            description: Set(form.description),
            event_date: Set(form.event_date.map(|d| d.timestamp())),
            event_type: Set(form.event_type),
            location: Set(form.location),
            deadline: Set(form.deadline.timestamp()),
            status: Set(FormStatus::Draft.to_string()),
            review_status: Set(ReviewStatus::None.to_string()),
            review_comment: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            reminder_schedule: Set(schedule),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| PermissionError::database_operation(format!("创建表单失败: {e}")))?;

        insert_fields(&txn, created.id, form.fields).await?;

        txn.commit()
            .await
            .map_err(|e| PermissionError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created.into_form())
    }

    /// 通过 ID 获取表单
    pub async fn get_form_by_id_impl(&self, id: i64) -> Result<Option<PermissionForm>> {
        let result = PermissionForms::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单失败: {e}")))?;

        Ok(result.map(|m| m.into_form()))
    }

    /// 表单字段（按位置排序）
    pub async fn list_form_fields_impl(&self, form_id: i64) -> Result<Vec<FormField>> {
        let fields = FormFields::find()
            .filter(FieldColumn::FormId.eq(form_id))
            .order_by_asc(FieldColumn::Position)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单字段失败: {e}")))?;

        Ok(fields.into_iter().map(|m| m.into_field()).collect())
    }

    /// 分页列出表单
    pub async fn list_forms_with_pagination_impl(
        &self,
        query: FormListQuery,
    ) -> Result<FormListResponse> {
        let (page, size) = page_params(query.page, query.size);

        let mut select = PermissionForms::find();

        if let Some(school_id) = query.school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(review_status) = query.review_status {
            select = select.filter(Column::ReviewStatus.eq(review_status.to_string()));
        }

        // 可见性：本人创建或被共享
        if let Some(user_id) = query.visible_to {
            let shared_ids: Vec<i64> = FormShares::find()
                .select_only()
                .column(ShareColumn::FormId)
                .filter(ShareColumn::UserId.eq(user_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| {
                    PermissionError::database_operation(format!("查询共享表单失败: {e}"))
                })?;

            let mut visible = Condition::any().add(Column::CreatedBy.eq(user_id));
            if !shared_ids.is_empty() {
                visible = visible.add(Column::Id.is_in(shared_ids));
            }
            select = select.filter(visible);
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Title.contains(&escaped))
                    .add(Column::EventType.contains(&escaped))
                    .add(Column::Location.contains(&escaped)),
            );
        }

        select = select.order_by_desc(Column::CreatedAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单页数失败: {e}")))?;

        let forms = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单列表失败: {e}")))?;

        Ok(FormListResponse {
            items: forms.into_iter().map(|m| m.into_form()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新表单（fields 存在时整体替换）
    ///
    /// 设置了 `expected_status` 时表单状态不符返回冲突错误。
    pub async fn update_form_impl(
        &self,
        id: i64,
        changes: FormChanges,
    ) -> Result<Option<PermissionForm>> {
        if self.get_form_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut update = PermissionForms::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(Column::Id.eq(id));

        if let Some(expected) = changes.expected_status {
            update = update.filter(Column::Status.eq(expected.to_string()));
        }
        if let Some(title) = changes.title {
            update = update.col_expr(Column::Title, Expr::value(title));
        }
        if let Some(description) = changes.description {
            update = update.col_expr(Column::Description, Expr::value(Some(description)));
        }
        if let Some(event_date) = changes.event_date {
            update = update.col_expr(Column::EventDate, Expr::value(Some(event_date.timestamp())));
        }
        if let Some(event_type) = changes.event_type {
            update = update.col_expr(Column::EventType, Expr::value(Some(event_type)));
        }
        if let Some(location) = changes.location {
            update = update.col_expr(Column::Location, Expr::value(Some(location)));
        }
        if let Some(deadline) = changes.deadline {
            update = update.col_expr(Column::Deadline, Expr::value(deadline.timestamp()));
        }
        if let Some(schedule) = changes.reminder_schedule {
            update = update.col_expr(
                Column::ReminderSchedule,
                Expr::value(serde_json::to_string(&schedule)?),
            );
        }
        if let Some(review_status) = changes.review_status {
            update = update.col_expr(Column::ReviewStatus, Expr::value(review_status.to_string()));
            if review_status == ReviewStatus::None {
                update = update
                    .col_expr(Column::ReviewComment, Expr::value(Option::<String>::None))
                    .col_expr(Column::ReviewedBy, Expr::value(Option::<i64>::None))
                    .col_expr(Column::ReviewedAt, Expr::value(Option::<i64>::None));
            }
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PermissionError::database_operation(format!("开启事务失败: {e}")))?;

        let result = update
            .exec(&txn)
            .await
            .map_err(write_error("更新表单失败"))?;
        if result.rows_affected == 0 {
            // 未提交的事务在 drop 时回滚
            return Err(PermissionError::conflict("表单状态已变化"));
        }

        if let Some(fields) = changes.fields {
            FormFields::delete_many()
                .filter(FieldColumn::FormId.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    PermissionError::database_operation(format!("删除表单字段失败: {e}"))
                })?;
            insert_fields(&txn, id, fields).await?;
        }

        txn.commit()
            .await
            .map_err(|e| PermissionError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_form_by_id_impl(id).await
    }

    /// 条件状态流转，表单不在 `from` 状态（或要求审核通过但未通过）时返回 false
    pub async fn transition_form_status_impl(
        &self,
        id: i64,
        from: FormStatus,
        to: FormStatus,
        require_approved: bool,
    ) -> Result<bool> {
        let mut update = PermissionForms::update_many()
            .col_expr(Column::Status, Expr::value(to.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(from.to_string()));
        if require_approved {
            update = update.filter(Column::ReviewStatus.eq(ReviewStatus::Approved.to_string()));
        }

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("更新表单状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 记录审核状态，仅草稿且审核状态在 `expected` 中时写入
    pub async fn record_form_review_impl(
        &self,
        id: i64,
        expected: &[ReviewStatus],
        status: ReviewStatus,
        comment: Option<String>,
        reviewer_id: Option<i64>,
    ) -> Result<bool> {
        let now = Utc::now().timestamp();
        let result = PermissionForms::update_many()
            .col_expr(Column::ReviewStatus, Expr::value(status.to_string()))
            .col_expr(Column::ReviewComment, Expr::value(comment))
            .col_expr(Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(Column::ReviewedAt, Expr::value(reviewer_id.map(|_| now)))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(FormStatus::Draft.to_string()))
            .filter(Column::ReviewStatus.is_in(expected.iter().map(|s| s.to_string())))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("更新审核状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除表单（级联删除字段、提交、附件、共享与提醒记录）
    pub async fn delete_form_impl(&self, id: i64) -> Result<bool> {
        let result = PermissionForms::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除表单失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 关闭已过截止时间的活跃表单
    pub async fn close_expired_forms_impl(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>> {
        let expired = PermissionForms::find()
            .filter(Column::Status.eq(FormStatus::Active.to_string()))
            .filter(Column::Deadline.lte(now.timestamp()))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询过期表单失败: {e}")))?;

        if expired.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = expired.iter().map(|f| f.id).collect();
        PermissionForms::update_many()
            .col_expr(Column::Status, Expr::value(FormStatus::Closed.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(now.timestamp()))
            .filter(Column::Id.is_in(ids))
            .filter(Column::Status.eq(FormStatus::Active.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("关闭过期表单失败: {e}")))?;

        Ok(expired
            .into_iter()
            .map(|m| {
                let mut form = m.into_form();
                form.status = FormStatus::Closed;
                form
            })
            .collect())
    }

    /// 截止时间未到的活跃表单
    pub async fn list_open_forms_impl(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>> {
        let forms = PermissionForms::find()
            .filter(Column::Status.eq(FormStatus::Active.to_string()))
            .filter(Column::Deadline.gt(now.timestamp()))
            .order_by_asc(Column::Deadline)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询活跃表单失败: {e}")))?;

        Ok(forms.into_iter().map(|m| m.into_form()).collect())
    }
}
