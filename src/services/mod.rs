pub mod audit;
pub mod auth;
pub mod documents;
pub mod email;
pub mod forms;
pub mod reminders;
pub mod schools;
pub mod students;
pub mod submissions;
pub mod system;
pub mod users;

pub use audit::AuditService;
pub use auth::AuthService;
pub use documents::DocumentService;
pub use email::{EmailMessage, EmailSender};
pub use forms::FormService;
pub use reminders::ReminderService;
pub use schools::SchoolService;
pub use students::StudentService;
pub use submissions::SubmissionService;
pub use system::SystemService;
pub use users::UserService;

use actix_web::{
    HttpRequest, HttpResponse, Result as ActixResult, error::InternalError, http::StatusCode, web,
};
use std::sync::Arc;
use tracing::error;

use crate::errors::PermissionError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 从 app_data 读取共享组件（存储、缓存、邮件）
pub(crate) fn app_state<T: ?Sized + 'static>(request: &HttpRequest) -> ActixResult<Arc<T>> {
    request
        .app_data::<web::Data<Arc<T>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("app_data 中缺少 {}", std::any::type_name::<T>());
            InternalError::from_response(
                "missing app data",
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "服务器内部错误",
                ),
            )
            .into()
        })
}

/// 当前登录用户，路由未挂 RequireJWT 时返回 401
pub(crate) fn current_user(request: &HttpRequest) -> ActixResult<User> {
    RequireJWT::extract_user_claims(request)
        .ok_or_else(|| InternalError::from_response("未登录", RequireJWT::unauthorized()).into())
}

pub(crate) fn error_response(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::error_empty(code, message))
}

/// 存储层错误统一转换：唯一约束冲突返回 409，其余记录日志后返回 500
pub(crate) fn storage_error(context: &str, err: PermissionError) -> HttpResponse {
    match err {
        PermissionError::Conflict(_) => {
            error_response(StatusCode::CONFLICT, ErrorCode::Conflict, format!("{context}: 记录已存在"))
        }
        PermissionError::NotFound(msg) => {
            error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, msg)
        }
        other => {
            error!("{}: {}", context, other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                format!("{context}失败"),
            )
        }
    }
}

pub(crate) fn forbidden(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    error_response(StatusCode::FORBIDDEN, code, message)
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, code, message)
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, code, message)
}

pub(crate) fn conflict(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    error_response(StatusCode::CONFLICT, code, message)
}

/// 确定操作的目标学校：管理员必须显式指定，其他角色固定为自己所在学校
pub(crate) fn target_school(user: &User, requested: Option<i64>) -> Result<i64, HttpResponse> {
    if user.is_admin() {
        return requested.ok_or_else(|| {
            bad_request(ErrorCode::UserSchoolRequired, "管理员需要指定 school_id")
        });
    }
    match (user.school_id, requested) {
        (Some(own), Some(other)) if own != other => Err(forbidden(
            ErrorCode::SchoolPermissionDenied,
            "无权操作其他学校的数据",
        )),
        (Some(own), _) => Ok(own),
        (None, _) => Err(forbidden(ErrorCode::UserSchoolRequired, "当前用户不属于任何学校")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserRole, UserStatus};

    fn user(role: UserRole, school_id: Option<i64>) -> User {
        let now = chrono::Utc::now();
        User {
            id: 7,
            school_id,
            email: "teacher@maple.edu".to_string(),
            display_name: "Ms. Rivera".to_string(),
            password_hash: None,
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_must_name_school() {
        let admin = user(UserRole::Admin, None);
        assert!(target_school(&admin, None).is_err());
        assert_eq!(target_school(&admin, Some(4)).ok(), Some(4));
    }

    #[test]
    fn test_teacher_is_pinned_to_own_school() {
        let teacher = user(UserRole::Teacher, Some(2));
        assert_eq!(target_school(&teacher, None).ok(), Some(2));
        assert_eq!(target_school(&teacher, Some(2)).ok(), Some(2));
        assert!(target_school(&teacher, Some(3)).is_err());
    }

    #[test]
    fn test_storage_conflict_maps_to_409() {
        let resp = storage_error("创建学校", PermissionError::conflict("UNIQUE"));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = storage_error("创建学校", PermissionError::database_operation("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
