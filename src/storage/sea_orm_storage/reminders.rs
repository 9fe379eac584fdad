//! 提醒记录存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, write_error};
use crate::entity::form_submissions::{Column as SubmissionColumn, Entity as FormSubmissions};
use crate::entity::reminder_logs::{ActiveModel, Column, Entity as ReminderLogs};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{PermissionError, Result};
use crate::models::{
    reminders::entities::PendingReminder, submissions::entities::SubmissionStatus,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 表单中待签署的提交，每个家长一行
    pub async fn list_pending_reminders_impl(&self, form_id: i64) -> Result<Vec<PendingReminder>> {
        let submissions = FormSubmissions::find()
            .filter(SubmissionColumn::FormId.eq(form_id))
            .filter(SubmissionColumn::Status.eq(SubmissionStatus::Pending.to_string()))
            .order_by_asc(SubmissionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询待签署提交失败: {e}")))?;

        if submissions.is_empty() {
            return Ok(Vec::new());
        }

        let student_ids: Vec<i64> = submissions.iter().map(|s| s.student_id).collect();
        let students: HashMap<i64, _> = Students::find()
            .filter(StudentColumn::Id.is_in(student_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut parents_by_student: HashMap<i64, Vec<_>> = HashMap::new();
        for (student_id, parent) in self.list_parents_for_students_impl(&student_ids).await? {
            parents_by_student.entry(student_id).or_default().push(parent);
        }

        let mut pending = Vec::new();
        for submission in submissions {
            let Some(student) = students.get(&submission.student_id) else {
                continue;
            };
            let Some(parents) = parents_by_student.get(&submission.student_id) else {
                continue;
            };
            for parent in parents {
                pending.push(PendingReminder {
                    submission_id: submission.id,
                    form_id: submission.form_id,
                    student_id: student.id,
                    student_name: format!("{} {}", student.first_name, student.last_name),
                    parent_id: parent.parent_id,
                    parent_email: parent.email.clone(),
                    parent_name: parent.display_name.clone(),
                    submission_created_at: crate::entity::to_datetime(submission.created_at),
                });
            }
        }

        Ok(pending)
    }

    /// 占用 (submission, offset) 提醒记录，唯一约束冲突返回 false
    pub async fn claim_reminder_impl(
        &self,
        submission_id: i64,
        form_id: i64,
        offset_minutes: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let model = ActiveModel {
            submission_id: Set(submission_id),
            form_id: Set(form_id),
            offset_minutes: Set(offset_minutes),
            sent_at: Set(at.timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await.map_err(write_error("写入提醒记录失败")) {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 释放提醒记录（发送失败时调用，便于下次重试）
    pub async fn release_reminder_impl(&self, submission_id: i64, offset_minutes: i64) -> Result<bool> {
        let result = ReminderLogs::delete_many()
            .filter(Column::SubmissionId.eq(submission_id))
            .filter(Column::OffsetMinutes.eq(offset_minutes))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除提醒记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
