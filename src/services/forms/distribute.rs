use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

use super::FormService;
use super::access::{FormAccess, load_form};
use super::distribution::{distribution_recipients, group_by_parent, ignored_student_ids};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    forms::{requests::DistributeFormRequest, responses::DistributionResult},
    students::entities::Student,
};
use crate::services::email::templates;
use crate::services::{audit, bad_request, conflict, current_user, storage_error};

/// 为目标学生创建待签署提交，并给每位家长发送一封通知
pub async fn distribute_form(
    service: &FormService,
    id: i64,
    mut targets: DistributeFormRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;
    let sender = service.get_email_sender(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Manage, "分发表单").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    if !form.accepts_signatures(Utc::now()) {
        return Ok(conflict(
            ErrorCode::FormInvalidState,
            "只能分发已发布且未过截止时间的表单",
        ));
    }
    targets.grades.retain(|g| !g.trim().is_empty());
    targets.groups.retain(|g| !g.trim().is_empty());
    if targets.is_empty() {
        return Ok(bad_request(ErrorCode::BadRequest, "请至少指定一个分发目标"));
    }

    // 只解析表单所属学校的学生
    let students = match storage.resolve_students(form.school_id, &targets).await {
        Ok(students) => students,
        Err(e) => return Ok(storage_error("分发表单", e)),
    };
    let mut result = DistributionResult {
        targeted: students.len(),
        ignored_student_ids: ignored_student_ids(&targets.student_ids, &students),
        ..Default::default()
    };

    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();
    let created = match storage.create_submissions(form.id, &student_ids).await {
        Ok(created) => created,
        Err(e) => return Ok(storage_error("分发表单", e)),
    };
    result.created = created.len();
    result.already_distributed = students.len().saturating_sub(created.len());

    if !created.is_empty() {
        let by_id: HashMap<i64, &Student> = students.iter().map(|s| (s.id, s)).collect();
        let new_pairs: Vec<(i64, Student)> = created
            .iter()
            .filter_map(|sub| by_id.get(&sub.student_id).map(|s| (sub.id, (*s).clone())))
            .collect();
        let new_ids: Vec<i64> = new_pairs.iter().map(|(_, s)| s.id).collect();

        match storage.list_parents_for_students(&new_ids).await {
            Ok(parents) => {
                let notices = group_by_parent(distribution_recipients(&new_pairs, &parents));
                let branding = templates::Branding::from_config();
                for notice in notices {
                    let message = templates::form_distributed(
                        &branding,
                        &notice.email,
                        &notice.name,
                        &form,
                        &notice.students,
                    );
                    match sender.send(&message).await {
                        Ok(()) => result.emails_sent += 1,
                        Err(e) => {
                            warn!("表单 {} 通知家长 {} 失败: {}", form.id, notice.parent_id, e);
                            result.emails_failed += 1;
                        }
                    }
                }
            }
            // 提交已创建，通知失败不回滚
            Err(e) => warn!("查询表单 {} 的家长失败，跳过通知: {}", form.id, e),
        }
    }

    info!(
        "表单 {} 分发完成: 目标 {}, 新建 {}, 已存在 {}, 邮件成功 {} 失败 {}",
        form.id,
        result.targeted,
        result.created,
        result.already_distributed,
        result.emails_sent,
        result.emails_failed
    );

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("form.distribute", "form", Some(form.id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({
                "targeted": result.targeted,
                "created": result.created,
                "already_distributed": result.already_distributed,
                "ignored_student_ids": result.ignored_student_ids,
                "emails_sent": result.emails_sent,
                "emails_failed": result.emails_failed,
            })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result, "表单分发完成")))
}
