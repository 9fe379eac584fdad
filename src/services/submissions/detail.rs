use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::{
    ApiResponse, ErrorCode, submissions::responses::SubmissionDetail, users::entities::UserRole,
};
use crate::services::forms::access::form_access;
use crate::services::{current_user, not_found, storage_error};

/// 家长可查看自己学生的提交，教职工需要表单读权限
pub async fn get_submission(
    service: &SubmissionService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let submission = match storage.get_submission_by_id(id).await {
        Ok(Some(submission)) => submission,
        Ok(None) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Ok(storage_error("获取提交", e)),
    };
    let form = match storage.get_form_by_id(submission.form_id).await {
        Ok(Some(form)) => form,
        Ok(None) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Ok(storage_error("获取提交", e)),
    };

    let allowed = if user.role == UserRole::Parent {
        storage.is_parent_of(user.id, submission.student_id).await
    } else {
        form_access(storage.as_ref(), &user, &form)
            .await
            .map(|access| access.can_read())
    };
    match allowed {
        Ok(true) => {}
        // 无权查看时与不存在的提交返回相同结果
        Ok(false) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Ok(storage_error("获取提交", e)),
    }

    let student = match storage.get_student_by_id(submission.student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(not_found(ErrorCode::StudentNotFound, "学生不存在")),
        Err(e) => return Ok(storage_error("获取提交", e)),
    };
    let fields = match storage.list_form_fields(form.id).await {
        Ok(fields) => fields,
        Err(e) => return Ok(storage_error("获取提交", e)),
    };

    let detail = SubmissionDetail {
        submission,
        student,
        form,
        fields,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "获取提交成功")))
}
