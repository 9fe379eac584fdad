//! 表单提交存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, page_params, write_error};
use crate::entity::form_submissions::{ActiveModel, Column, Entity as FormSubmissions};
use crate::entity::permission_forms::{Column as FormColumn, Entity as PermissionForms};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{PermissionError, Result};
use crate::models::{
    PaginationInfo,
    forms::{entities::FormStatus, responses::FormStats},
    submissions::{
        entities::{FormSubmission, SubmissionStatus},
        requests::{SubmissionDecision, SubmissionListQuery},
        responses::{ParentSubmissionItem, SubmissionListItem, SubmissionListResponse},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 批量创建待签署提交，(form_id, student_id) 唯一索引冲突时跳过
    pub async fn create_submissions_impl(
        &self,
        form_id: i64,
        student_ids: &[i64],
    ) -> Result<Vec<FormSubmission>> {
        let now = Utc::now().timestamp();
        let mut created = Vec::with_capacity(student_ids.len());

        for &student_id in student_ids {
            let model = ActiveModel {
                form_id: Set(form_id),
                student_id: Set(student_id),
                parent_id: Set(None),
                status: Set(SubmissionStatus::Pending.to_string()),
                responses: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match model.insert(&self.db).await.map_err(write_error("创建提交失败")) {
                Ok(m) => created.push(m.into_submission()),
                Err(e) if e.is_conflict() => {
                    tracing::debug!(form_id, student_id, "提交已存在，跳过");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(created)
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<FormSubmission>> {
        let result = FormSubmissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 表单的全部提交
    pub async fn list_form_submissions_impl(&self, form_id: i64) -> Result<Vec<FormSubmission>> {
        let submissions = FormSubmissions::find()
            .filter(Column::FormId.eq(form_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(submissions.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 分页列出表单提交，附带学生与签署人信息
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let (page, size) = page_params(query.page, query.size);

        let mut select = FormSubmissions::find().filter(Column::FormId.eq(query.form_id));

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_asc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交页数失败: {e}")))?;

        let submissions = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交列表失败: {e}")))?;

        // 批量查询学生信息
        let student_ids: Vec<i64> = submissions.iter().map(|s| s.student_id).collect();
        let students: HashMap<i64, _> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            Students::find()
                .filter(StudentColumn::Id.is_in(student_ids))
                .all(&self.db)
                .await
                .map_err(|e| PermissionError::database_operation(format!("查询学生失败: {e}")))?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        // 批量查询签署人信息
        let signer_ids: Vec<i64> = submissions.iter().filter_map(|s| s.parent_id).collect();
        let signers: HashMap<i64, _> = if signer_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(UserColumn::Id.is_in(signer_ids))
                .all(&self.db)
                .await
                .map_err(|e| PermissionError::database_operation(format!("查询签署人失败: {e}")))?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        let items = submissions
            .into_iter()
            .map(|m| {
                let submission = m.into_submission();
                let student = students.get(&submission.student_id);
                let signer = submission.parent_id.and_then(|id| signers.get(&id));
                SubmissionListItem {
                    student_name: student
                        .map(|s| format!("{} {}", s.first_name, s.last_name))
                        .unwrap_or_default(),
                    grade: student.map(|s| s.grade.clone()).unwrap_or_default(),
                    group_name: student.and_then(|s| s.group_name.clone()),
                    signer_name: signer.map(|u| u.display_name.clone()),
                    signer_email: signer.map(|u| u.email.clone()),
                    submission,
                }
            })
            .collect();

        Ok(SubmissionListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 家长关联学生的提交（不含草稿表单）
    pub async fn list_parent_submissions_impl(
        &self,
        parent_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<ParentSubmissionItem>> {
        let student_ids = self.list_parent_student_ids_impl(parent_id).await?;

        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = FormSubmissions::find().filter(Column::StudentId.is_in(student_ids));
        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let submissions = select
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询提交失败: {e}")))?;

        if submissions.is_empty() {
            return Ok(Vec::new());
        }

        let form_ids: Vec<i64> = submissions.iter().map(|s| s.form_id).collect();
        let forms: HashMap<i64, _> = PermissionForms::find()
            .filter(FormColumn::Id.is_in(form_ids))
            .filter(FormColumn::Status.ne(FormStatus::Draft.to_string()))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询表单失败: {e}")))?
            .into_iter()
            .map(|f| (f.id, f.into_form()))
            .collect();

        let ids: Vec<i64> = submissions.iter().map(|s| s.student_id).collect();
        let students: HashMap<i64, _> = Students::find()
            .filter(StudentColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s.into_student()))
            .collect();

        Ok(submissions
            .into_iter()
            .filter_map(|m| {
                let form = forms.get(&m.form_id)?.clone();
                let student = students.get(&m.student_id)?.clone();
                Some(ParentSubmissionItem {
                    submission: m.into_submission(),
                    student,
                    form,
                })
            })
            .collect())
    }

    /// 写入签署或拒绝结果，仅对 pending 状态生效
    pub async fn record_submission_decision_impl(
        &self,
        id: i64,
        decision: SubmissionDecision,
    ) -> Result<bool> {
        let now = Utc::now().timestamp();
        let responses = serde_json::to_string(&decision.responses)?;
        let signed_at = (decision.status == SubmissionStatus::Signed).then_some(now);

        let result = FormSubmissions::update_many()
            .col_expr(Column::Status, Expr::value(decision.status.to_string()))
            .col_expr(Column::ParentId, Expr::value(decision.parent_id))
            .col_expr(Column::Signature, Expr::value(decision.signature))
            .col_expr(Column::DeclineReason, Expr::value(decision.decline_reason))
            .col_expr(Column::Responses, Expr::value(responses))
            .col_expr(Column::SignedAt, Expr::value(signed_at))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(SubmissionStatus::Pending.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("更新提交失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 按状态统计提交数量
    pub async fn get_form_stats_impl(&self, form_id: i64) -> Result<FormStats> {
        let rows: Vec<(String, i64)> = FormSubmissions::find()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "count")
            .filter(Column::FormId.eq(form_id))
            .group_by(Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("统计提交失败: {e}")))?;

        let mut counts: HashMap<SubmissionStatus, i64> = HashMap::new();
        for (status, count) in rows {
            if let Ok(status) = status.parse::<SubmissionStatus>() {
                counts.insert(status, count);
            }
        }

        let get = |s: SubmissionStatus| counts.get(&s).copied().unwrap_or(0);
        Ok(FormStats::from_counts(
            get(SubmissionStatus::Pending),
            get(SubmissionStatus::Signed),
            get(SubmissionStatus::Declined),
        ))
    }

    /// 更新最后提醒时间
    pub async fn mark_submissions_reminded_impl(
        &self,
        ids: &[i64],
        at: DateTime<Utc>,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = FormSubmissions::update_many()
            .col_expr(Column::LastRemindedAt, Expr::value(at.timestamp()))
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("更新提醒时间失败: {e}")))?;

        Ok(result.rows_affected)
    }
}
