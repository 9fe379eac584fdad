use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use super::{ReminderSchedule, ReminderService};
use crate::errors::Result;
use crate::models::{
    ApiResponse, audit::entities::NewAuditLog, forms::entities::PermissionForm,
    reminders::{entities::PendingReminder, responses::CronRunReport},
};
use crate::services::email::{EmailSender, templates};
use crate::services::forms::distribution::{Recipient, group_by_parent};
use crate::services::{audit, storage_error};
use crate::storage::Storage;

/// 每个待签署提交当前应发送的偏移量，同一提交的多位家长只算一次
pub fn due_reminders(
    schedule: &ReminderSchedule,
    deadline: DateTime<Utc>,
    rows: &[PendingReminder],
    now: DateTime<Utc>,
) -> Vec<(i64, i64)> {
    let mut created: BTreeMap<i64, DateTime<Utc>> = BTreeMap::new();
    for row in rows {
        created.entry(row.submission_id).or_insert(row.submission_created_at);
    }
    created
        .into_iter()
        .filter_map(|(submission_id, created_at)| {
            schedule
                .due_offset(deadline, created_at, now)
                .map(|offset| (submission_id, offset))
        })
        .collect()
}

pub(crate) fn recipient(row: &PendingReminder) -> Recipient {
    Recipient {
        parent_id: row.parent_id,
        email: row.parent_email.clone(),
        name: row.parent_name.clone(),
        submission_id: row.submission_id,
        student_name: row.student_name.clone(),
    }
}

/// 一次完整的提醒扫描：先关闭过期表单，再按计划发送提醒
pub async fn run_reminder_pass(
    storage: &dyn Storage,
    sender: &dyn EmailSender,
    now: DateTime<Utc>,
) -> Result<CronRunReport> {
    let mut report = CronRunReport::default();

    let closed = storage.close_expired_forms(now).await?;
    report.forms_closed = closed.len();
    for form in &closed {
        debug!("表单 {} 已过截止时间，自动关闭", form.id);
    }

    let forms = storage.list_open_forms(now).await?;
    report.forms_scanned = forms.len();

    let branding = templates::Branding::from_config();
    for form in &forms {
        // 单个表单失败不影响其他表单
        if let Err(e) = remind_form_on_schedule(storage, sender, &branding, form, now, &mut report).await {
            warn!("表单 {} 的提醒处理失败: {}", form.id, e);
        }
    }

    info!(
        "提醒扫描完成: 扫描 {} 个表单, 发送 {}, 失败 {}, 跳过 {}, 关闭 {}",
        report.forms_scanned,
        report.reminders_sent,
        report.reminders_failed,
        report.reminders_skipped,
        report.forms_closed
    );
    Ok(report)
}

async fn remind_form_on_schedule(
    storage: &dyn Storage,
    sender: &dyn EmailSender,
    branding: &templates::Branding,
    form: &PermissionForm,
    now: DateTime<Utc>,
    report: &mut CronRunReport,
) -> Result<()> {
    let schedule = ReminderSchedule::parse_lenient(&form.reminder_schedule);
    if schedule.is_empty() {
        return Ok(());
    }

    let rows = storage.list_pending_reminders(form.id).await?;
    let due = due_reminders(&schedule, form.deadline, &rows, now);
    if due.is_empty() {
        return Ok(());
    }

    // 先占用再发送，占用失败说明其他实例已处理；单个提交出错只计失败
    let mut claimed: BTreeMap<i64, i64> = BTreeMap::new();
    for (submission_id, offset) in due {
        match storage.claim_reminder(submission_id, form.id, offset, now).await {
            Ok(true) => {
                claimed.insert(submission_id, offset);
            }
            Ok(false) => report.reminders_skipped += 1,
            Err(e) => {
                warn!("占用提交 {} 的提醒记录失败: {}", submission_id, e);
                report.reminders_failed += 1;
            }
        }
    }
    if claimed.is_empty() {
        return Ok(());
    }

    let notices = group_by_parent(
        rows.iter()
            .filter(|row| claimed.contains_key(&row.submission_id))
            .map(recipient),
    );

    let mut delivered: HashSet<i64> = HashSet::new();
    for notice in &notices {
        let message = templates::reminder(branding, &notice.email, &notice.name, form, &notice.students);
        match sender.send(&message).await {
            Ok(()) => {
                report.reminders_sent += 1;
                delivered.extend(notice.submission_ids.iter().copied());
            }
            Err(e) => {
                warn!("发送提醒到 {} 失败: {}", notice.email, e);
                report.reminders_failed += 1;
            }
        }
    }

    // 没有任何家长收到邮件的提交释放占用，下次扫描重试
    for (submission_id, offset) in &claimed {
        if delivered.contains(submission_id) {
            continue;
        }
        if let Err(e) = storage.release_reminder(*submission_id, *offset).await {
            warn!("释放提交 {} 的提醒记录失败: {}", submission_id, e);
        }
    }

    let delivered: Vec<i64> = delivered.into_iter().collect();
    if !delivered.is_empty()
        && let Err(e) = storage.mark_submissions_reminded(&delivered, now).await
    {
        warn!("更新表单 {} 的提醒时间失败: {}", form.id, e);
    }
    Ok(())
}

pub async fn handle_cron(
    service: &ReminderService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let sender = service.get_email_sender(request)?;

    let report = match run_reminder_pass(storage.as_ref(), sender.as_ref(), Utc::now()).await {
        Ok(report) => report,
        Err(e) => return Ok(storage_error("执行提醒任务", e)),
    };

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("cron.reminders", "system", None).details(json!(report)),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report, "提醒任务执行完成")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).single().expect("valid time")
    }

    fn row(submission_id: i64, parent_id: i64, created_at: DateTime<Utc>) -> PendingReminder {
        PendingReminder {
            submission_id,
            form_id: 1,
            student_id: submission_id * 10,
            student_name: format!("Student {submission_id}"),
            parent_id,
            parent_email: format!("parent{parent_id}@example.com"),
            parent_name: format!("Parent {parent_id}"),
            submission_created_at: created_at,
        }
    }

    #[test]
    fn test_due_reminders_collapses_parents() {
        let schedule = ReminderSchedule::parse(&["3d", "1d"]).expect("valid schedule");
        let deadline = at(20, 12);
        let rows = vec![row(1, 100, at(1, 9)), row(1, 101, at(1, 9)), row(2, 100, at(1, 9))];

        let due = due_reminders(&schedule, deadline, &rows, at(18, 0));
        assert_eq!(due, vec![(1, 3 * 24 * 60), (2, 3 * 24 * 60)]);
    }

    #[test]
    fn test_late_submission_skips_earlier_trigger() {
        let schedule = ReminderSchedule::parse(&["3d", "1d"]).expect("valid schedule");
        let deadline = at(20, 12);
        // 在 3d 触发点之后才分发的提交只会收到 1d 提醒
        let rows = vec![row(5, 100, at(18, 0))];

        assert!(due_reminders(&schedule, deadline, &rows, at(18, 6)).is_empty());
        let due = due_reminders(&schedule, deadline, &rows, deadline - Duration::hours(2));
        assert_eq!(due, vec![(5, 24 * 60)]);
    }

    #[test]
    fn test_nothing_due_after_deadline() {
        let schedule = ReminderSchedule::parse(&["1d"]).expect("valid schedule");
        let rows = vec![row(1, 100, at(1, 9))];
        assert!(due_reminders(&schedule, at(20, 12), &rows, at(21, 0)).is_empty());
    }
}
