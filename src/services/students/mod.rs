pub mod create;
pub mod delete;
pub mod get;
pub mod import;
pub mod list;
pub mod parents;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::PermissionError;
use crate::models::{
    ErrorCode,
    students::{
        entities::Student,
        requests::{CreateStudentRequest, LinkParentRequest, StudentListParams, UpdateStudentRequest},
    },
    users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    },
};
use crate::services::{app_state, bad_request, forbidden, not_found, storage_error};
use crate::storage::Storage;
use crate::utils::validate::{normalize_email, validate_email};

pub struct StudentService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => app_state::<dyn Storage>(request),
        }
    }

    pub async fn list_students(
        &self,
        params: StudentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, params, request).await
    }

    pub async fn create_student(
        &self,
        student: CreateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_student(self, student, request).await
    }

    pub async fn get_student(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_student(self, id, request).await
    }

    pub async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_student(self, id, update, request).await
    }

    pub async fn delete_student(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_student(self, id, request).await
    }

    pub async fn link_parent(
        &self,
        student_id: i64,
        link: LinkParentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        parents::link_parent(self, student_id, link, request).await
    }

    pub async fn unlink_parent(
        &self,
        student_id: i64,
        parent_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        parents::unlink_parent(self, student_id, parent_id, request).await
    }

    pub async fn import_students(
        &self,
        school_id: Option<i64>,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        import::import_students(self, school_id, payload, request).await
    }
}

/// 读取学生并检查调用者是否可以访问其学校
pub(crate) async fn load_student(
    storage: &dyn Storage,
    user: &User,
    id: i64,
    context: &str,
) -> Result<Student, HttpResponse> {
    match storage.get_student_by_id(id).await {
        Ok(Some(student)) if user.can_access_school(student.school_id) => Ok(student),
        Ok(Some(_)) => Err(forbidden(ErrorCode::SchoolPermissionDenied, "无权访问该学生")),
        Ok(None) => Err(not_found(ErrorCode::StudentNotFound, "学生不存在")),
        Err(e) => Err(storage_error(context, e)),
    }
}

/// 查找或创建家长失败的原因
#[derive(Debug)]
pub(crate) enum ParentLookupError {
    InvalidEmail(&'static str),
    NotAParent,
    OtherSchool,
    Storage(PermissionError),
}

impl ParentLookupError {
    pub(crate) fn message(&self) -> String {
        match self {
            Self::InvalidEmail(msg) => msg.to_string(),
            Self::NotAParent => "该邮箱属于非家长账号".to_string(),
            Self::OtherSchool => "该家长属于其他学校".to_string(),
            Self::Storage(e) => e.message().to_string(),
        }
    }

    pub(crate) fn into_response(self, context: &str) -> HttpResponse {
        match self {
            Self::InvalidEmail(msg) => bad_request(ErrorCode::UserEmailInvalid, msg),
            Self::Storage(e) => storage_error(context, e),
            other => bad_request(ErrorCode::ParentLinkFailed, other.message()),
        }
    }
}

/// 按邮箱查找学校内的家长，不存在时创建；返回 (家长, 是否新建)
pub(crate) async fn find_or_create_parent(
    storage: &dyn Storage,
    school_id: i64,
    email: &str,
    display_name: Option<&str>,
) -> Result<(User, bool), ParentLookupError> {
    let email = normalize_email(email);
    validate_email(&email).map_err(ParentLookupError::InvalidEmail)?;

    match storage.get_user_by_email(&email).await {
        Ok(Some(user)) if user.role != UserRole::Parent => Err(ParentLookupError::NotAParent),
        Ok(Some(user)) if user.school_id != Some(school_id) => Err(ParentLookupError::OtherSchool),
        Ok(Some(user)) => Ok((user, false)),
        Ok(None) => {
            let display_name = display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| name.chars().take(100).collect::<String>())
                .unwrap_or_else(|| default_display_name(&email));
            let request = CreateUserRequest {
                email: email.clone(),
                display_name,
                password: None,
                role: UserRole::Parent,
                school_id: Some(school_id),
            };
            match storage.create_user(request).await {
                Ok(user) => Ok((user, true)),
                // 并发创建时改为读取已存在的账号
                Err(e) if e.is_conflict() => match storage.get_user_by_email(&email).await {
                    Ok(Some(user)) if user.role == UserRole::Parent && user.school_id == Some(school_id) => {
                        Ok((user, false))
                    }
                    Ok(Some(_)) => Err(ParentLookupError::OtherSchool),
                    Ok(None) => Err(ParentLookupError::Storage(e)),
                    Err(e) => Err(ParentLookupError::Storage(e)),
                },
                Err(e) => Err(ParentLookupError::Storage(e)),
            }
        }
        Err(e) => Err(ParentLookupError::Storage(e)),
    }
}

/// 邮箱 @ 之前的部分作为默认显示名
fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// 规范化学生字段，返回错误消息
pub(crate) fn normalize_student_name(value: &mut String, field: &str) -> Result<(), String> {
    crate::utils::validate::validate_required_text(value, field, 100)?;
    *value = value.trim().to_string();
    Ok(())
}

/// 可选文本去空白，空串视为 None
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_display_name_uses_local_part() {
        assert_eq!(default_display_name("jo.parent@example.com"), "jo.parent");
    }

    #[test]
    fn test_normalize_optional_drops_blank() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(Some(" 4B ".to_string())), Some("4B".to_string()));
    }
}
