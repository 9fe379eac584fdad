use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    audit::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListQuery,
    },
    common::PaginatedResponse,
    documents::entities::{FormDocument, NewFormDocument},
    forms::{
        entities::{FormField, FormStatus, PermissionForm, ReviewStatus},
        requests::{DistributeFormRequest, FormChanges, FormListQuery, NewPermissionForm},
        responses::{FormListResponse, FormStats},
    },
    reminders::entities::PendingReminder,
    schools::{
        entities::School,
        requests::{CreateSchoolRequest, SchoolListQuery, UpdateSchoolRequest},
        responses::SchoolListResponse,
    },
    shares::entities::{FormShare, FormShareItem, SharePermission},
    students::{
        entities::{Student, StudentParent},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    submissions::{
        entities::{FormSubmission, SubmissionStatus},
        requests::{SubmissionDecision, SubmissionListQuery},
        responses::{ParentSubmissionItem, SubmissionListResponse},
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 学校管理方法
    async fn create_school(&self, school: CreateSchoolRequest) -> Result<School>;
    async fn get_school_by_id(&self, id: i64) -> Result<Option<School>>;
    async fn list_schools_with_pagination(
        &self,
        query: SchoolListQuery,
    ) -> Result<SchoolListResponse>;
    async fn update_school(&self, id: i64, update: UpdateSchoolRequest) -> Result<Option<School>>;
    async fn delete_school(&self, id: i64) -> Result<bool>;

    /// 用户管理方法
    // 创建用户（password 字段为已哈希的密码）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 列出学校中指定角色的活跃用户
    async fn list_school_users_by_role(&self, school_id: i64, role: UserRole) -> Result<Vec<User>>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 登录链接
    async fn create_magic_link(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;
    // 消费登录链接（单次有效），返回对应用户 ID
    async fn consume_magic_link(&self, token_hash: &str, now: DateTime<Utc>)
    -> Result<Option<i64>>;

    /// 学生管理方法
    async fn create_student(&self, school_id: i64, student: CreateStudentRequest)
    -> Result<Student>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_external_id(
        &self,
        school_id: i64,
        external_id: &str,
    ) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    async fn delete_student(&self, id: i64) -> Result<bool>;
    // 解析分发目标（限定在学校内）
    async fn resolve_students(
        &self,
        school_id: i64,
        targets: &DistributeFormRequest,
    ) -> Result<Vec<Student>>;

    /// 家长关联方法
    // 返回 false 表示已关联
    async fn link_parent(
        &self,
        parent_id: i64,
        student_id: i64,
        relationship: Option<String>,
    ) -> Result<bool>;
    async fn unlink_parent(&self, parent_id: i64, student_id: i64) -> Result<bool>;
    async fn list_student_parents(&self, student_id: i64) -> Result<Vec<StudentParent>>;
    // 批量查询学生的家长，返回 (student_id, 家长) 列表
    async fn list_parents_for_students(
        &self,
        student_ids: &[i64],
    ) -> Result<Vec<(i64, StudentParent)>>;
    async fn is_parent_of(&self, parent_id: i64, student_id: i64) -> Result<bool>;

    /// 表单管理方法
    async fn create_form(&self, form: NewPermissionForm) -> Result<PermissionForm>;
    async fn get_form_by_id(&self, id: i64) -> Result<Option<PermissionForm>>;
    async fn list_form_fields(&self, form_id: i64) -> Result<Vec<FormField>>;
    async fn list_forms_with_pagination(&self, query: FormListQuery) -> Result<FormListResponse>;
    // 更新表单（提供 fields 时整体替换）
    async fn update_form(&self, id: i64, changes: FormChanges) -> Result<Option<PermissionForm>>;
    // 条件状态流转，返回 false 表示表单已不在 from 状态
    async fn transition_form_status(
        &self,
        id: i64,
        from: FormStatus,
        to: FormStatus,
        require_approved: bool,
    ) -> Result<bool>;
    // 记录审核结果，只对审核状态在 expected 中的草稿生效
    async fn record_form_review(
        &self,
        id: i64,
        expected: &[ReviewStatus],
        status: ReviewStatus,
        comment: Option<String>,
        reviewer_id: Option<i64>,
    ) -> Result<bool>;
    async fn delete_form(&self, id: i64) -> Result<bool>;
    // 关闭已过截止时间的活跃表单，返回被关闭的表单
    async fn close_expired_forms(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>>;
    // 列出截止时间未到的活跃表单
    async fn list_open_forms(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>>;

    /// 表单提交方法
    // 批量创建待签署提交，已存在的学生跳过
    async fn create_submissions(
        &self,
        form_id: i64,
        student_ids: &[i64],
    ) -> Result<Vec<FormSubmission>>;
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<FormSubmission>>;
    async fn list_form_submissions(&self, form_id: i64) -> Result<Vec<FormSubmission>>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    async fn list_parent_submissions(
        &self,
        parent_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<ParentSubmissionItem>>;
    // 仅当提交仍为 pending 时写入，返回是否写入成功
    async fn record_submission_decision(
        &self,
        id: i64,
        decision: SubmissionDecision,
    ) -> Result<bool>;
    async fn get_form_stats(&self, form_id: i64) -> Result<FormStats>;
    async fn mark_submissions_reminded(&self, ids: &[i64], at: DateTime<Utc>) -> Result<u64>;

    /// 提醒方法
    // 表单中所有待签署提交及其家长
    async fn list_pending_reminders(&self, form_id: i64) -> Result<Vec<PendingReminder>>;
    // 占用提醒记录，返回 false 表示已被占用
    async fn claim_reminder(
        &self,
        submission_id: i64,
        form_id: i64,
        offset_minutes: i64,
        at: DateTime<Utc>,
    ) -> Result<bool>;
    async fn release_reminder(&self, submission_id: i64, offset_minutes: i64) -> Result<bool>;

    /// 附件方法
    async fn create_document(&self, document: NewFormDocument) -> Result<FormDocument>;
    async fn list_form_documents(&self, form_id: i64) -> Result<Vec<FormDocument>>;
    async fn get_document_by_id(&self, id: i64) -> Result<Option<FormDocument>>;
    async fn get_document_by_token(&self, token: &str) -> Result<Option<FormDocument>>;
    async fn delete_document(&self, id: i64) -> Result<bool>;

    /// 共享方法
    async fn upsert_form_share(
        &self,
        form_id: i64,
        user_id: i64,
        permission: SharePermission,
        shared_by: i64,
    ) -> Result<FormShare>;
    async fn get_form_share(&self, form_id: i64, user_id: i64) -> Result<Option<FormShare>>;
    async fn list_form_shares(&self, form_id: i64) -> Result<Vec<FormShareItem>>;
    async fn delete_form_share(&self, form_id: i64, user_id: i64) -> Result<bool>;

    /// 审计日志方法
    async fn create_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog>;
    async fn list_audit_logs_with_pagination(
        &self,
        query: AuditLogListQuery,
    ) -> Result<PaginatedResponse<AuditLog>>;

    /// 数据库连通性检查
    async fn ping(&self) -> Result<()>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
