//! 表单访问级别
//!
//! 管理员和创建者拥有全部权限，`edit` 共享可以管理表单，
//! `view` 共享与同校审核人只读。

use actix_web::HttpResponse;

use crate::models::{
    ErrorCode,
    forms::entities::PermissionForm,
    shares::entities::SharePermission,
    users::entities::{User, UserRole},
};
use crate::services::{forbidden, not_found, storage_error};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormAccess {
    None,
    Read,
    Manage,
    Owner,
}

impl FormAccess {
    pub fn can_read(self) -> bool {
        self >= FormAccess::Read
    }

    pub fn can_manage(self) -> bool {
        self >= FormAccess::Manage
    }
}

/// 根据用户、表单和共享记录计算访问级别
pub fn access_from(user: &User, form: &PermissionForm, share: Option<SharePermission>) -> FormAccess {
    if user.is_admin() || form.created_by == user.id {
        return FormAccess::Owner;
    }
    if user.school_id != Some(form.school_id) {
        return FormAccess::None;
    }
    match (share, user.role) {
        (Some(SharePermission::Edit), UserRole::Teacher | UserRole::Reviewer) => FormAccess::Manage,
        (Some(SharePermission::View), UserRole::Teacher | UserRole::Reviewer) => FormAccess::Read,
        (_, UserRole::Reviewer) => FormAccess::Read,
        _ => FormAccess::None,
    }
}

/// 查询共享记录后计算访问级别
pub async fn form_access(
    storage: &dyn Storage,
    user: &User,
    form: &PermissionForm,
) -> crate::errors::Result<FormAccess> {
    if user.is_admin() || form.created_by == user.id {
        return Ok(FormAccess::Owner);
    }
    if user.school_id != Some(form.school_id) || user.role == UserRole::Parent {
        return Ok(FormAccess::None);
    }
    let share = storage.get_form_share(form.id, user.id).await?;
    Ok(access_from(user, form, share.map(|s| s.permission)))
}

/// 读取表单并要求至少 `required` 级别的访问权限
pub async fn load_form(
    storage: &dyn Storage,
    user: &User,
    form_id: i64,
    required: FormAccess,
    context: &str,
) -> Result<(PermissionForm, FormAccess), HttpResponse> {
    let form = match storage.get_form_by_id(form_id).await {
        Ok(Some(form)) => form,
        Ok(None) => return Err(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => return Err(storage_error(context, e)),
    };

    let access = form_access(storage, user, &form)
        .await
        .map_err(|e| storage_error(context, e))?;

    if access == FormAccess::None {
        // 看不到的表单按不存在处理
        return Err(not_found(ErrorCode::FormNotFound, "表单不存在"));
    }
    if access < required {
        return Err(forbidden(ErrorCode::FormPermissionDenied, "无权执行此操作"));
    }
    Ok((form, access))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forms::entities::{FormStatus, ReviewStatus};
    use crate::models::users::entities::UserStatus;
    use chrono::Utc;

    fn user(id: i64, role: UserRole, school_id: Option<i64>) -> User {
        let now = Utc::now();
        User {
            id,
            school_id,
            email: format!("user{id}@maple.edu"),
            display_name: format!("User {id}"),
            password_hash: None,
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn form(created_by: i64, school_id: i64) -> PermissionForm {
        let now = Utc::now();
        PermissionForm {
            id: 1,
            school_id,
            created_by,
            title: "Zoo trip".to_string(),
            description: None,
            event_date: None,
            event_type: None,
            location: None,
            deadline: now,
            status: FormStatus::Draft,
            review_status: ReviewStatus::None,
            review_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            reminder_schedule: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_and_creator_own_the_form() {
        let f = form(10, 1);
        assert_eq!(access_from(&user(1, UserRole::Admin, None), &f, None), FormAccess::Owner);
        assert_eq!(access_from(&user(10, UserRole::Teacher, Some(1)), &f, None), FormAccess::Owner);
    }

    #[test]
    fn test_shares_grant_levels_within_school() {
        let f = form(10, 1);
        let colleague = user(11, UserRole::Teacher, Some(1));
        assert_eq!(access_from(&colleague, &f, None), FormAccess::None);
        assert_eq!(access_from(&colleague, &f, Some(SharePermission::View)), FormAccess::Read);
        assert_eq!(access_from(&colleague, &f, Some(SharePermission::Edit)), FormAccess::Manage);
    }

    #[test]
    fn test_reviewer_reads_same_school_only() {
        let f = form(10, 1);
        assert_eq!(access_from(&user(20, UserRole::Reviewer, Some(1)), &f, None), FormAccess::Read);
        assert_eq!(access_from(&user(21, UserRole::Reviewer, Some(2)), &f, None), FormAccess::None);
    }

    #[test]
    fn test_parent_never_gets_staff_access() {
        let f = form(10, 1);
        let parent = user(30, UserRole::Parent, Some(1));
        assert_eq!(access_from(&parent, &f, Some(SharePermission::Edit)), FormAccess::None);
    }

    #[test]
    fn test_level_helpers() {
        assert!(FormAccess::Manage.can_read());
        assert!(!FormAccess::Read.can_manage());
        assert!(FormAccess::Owner.can_manage());
    }
}
