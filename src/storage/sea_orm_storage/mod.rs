//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit;
mod documents;
mod forms;
mod magic_links;
mod reminders;
mod schools;
mod shares;
mod students;
mod submissions;
mod users;

use crate::config::AppConfig;
use crate::errors::{PermissionError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 使用已有连接创建存储并运行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| PermissionError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PermissionError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存数据库每个连接独立，只能使用单连接
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            config.database.pool_size
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| PermissionError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PermissionError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PermissionError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 数据库连通性检查
    pub async fn ping_impl(&self) -> Result<()> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| PermissionError::database_connection(format!("数据库不可用: {e}")))?;
        Ok(())
    }
}

/// 写操作错误映射，唯一约束冲突单独区分
pub(crate) fn write_error(context: &'static str) -> impl FnOnce(DbErr) -> PermissionError {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            PermissionError::conflict(format!("{context}: {msg}"))
        }
        _ => PermissionError::database_operation(format!("{context}: {e}")),
    }
}

/// 规范化分页参数
pub(crate) fn page_params(page: Option<i64>, size: Option<i64>) -> (u64, u64) {
    crate::models::PaginationQuery::normalized(page, size)
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 学校模块
    async fn create_school(&self, school: CreateSchoolRequest) -> Result<School> {
        self.create_school_impl(school).await
    }

    async fn get_school_by_id(&self, id: i64) -> Result<Option<School>> {
        self.get_school_by_id_impl(id).await
    }

    async fn list_schools_with_pagination(
        &self,
        query: SchoolListQuery,
    ) -> Result<SchoolListResponse> {
        self.list_schools_with_pagination_impl(query).await
    }

    async fn update_school(&self, id: i64, update: UpdateSchoolRequest) -> Result<Option<School>> {
        self.update_school_impl(id, update).await
    }

    async fn delete_school(&self, id: i64) -> Result<bool> {
        self.delete_school_impl(id).await
    }

    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn list_school_users_by_role(&self, school_id: i64, role: UserRole) -> Result<Vec<User>> {
        self.list_school_users_by_role_impl(school_id, role).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 登录链接模块
    async fn create_magic_link(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.create_magic_link_impl(user_id, token_hash, expires_at)
            .await
    }

    async fn consume_magic_link(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        self.consume_magic_link_impl(token_hash, now).await
    }

    // 学生模块
    async fn create_student(
        &self,
        school_id: i64,
        student: CreateStudentRequest,
    ) -> Result<Student> {
        self.create_student_impl(school_id, student).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_external_id(
        &self,
        school_id: i64,
        external_id: &str,
    ) -> Result<Option<Student>> {
        self.get_student_by_external_id_impl(school_id, external_id)
            .await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(id, update).await
    }

    async fn delete_student(&self, id: i64) -> Result<bool> {
        self.delete_student_impl(id).await
    }

    async fn resolve_students(
        &self,
        school_id: i64,
        targets: &DistributeFormRequest,
    ) -> Result<Vec<Student>> {
        self.resolve_students_impl(school_id, targets).await
    }

    // 家长关联模块
    async fn link_parent(
        &self,
        parent_id: i64,
        student_id: i64,
        relationship: Option<String>,
    ) -> Result<bool> {
        self.link_parent_impl(parent_id, student_id, relationship)
            .await
    }

    async fn unlink_parent(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        self.unlink_parent_impl(parent_id, student_id).await
    }

    async fn list_student_parents(&self, student_id: i64) -> Result<Vec<StudentParent>> {
        self.list_student_parents_impl(student_id).await
    }

    async fn list_parents_for_students(
        &self,
        student_ids: &[i64],
    ) -> Result<Vec<(i64, StudentParent)>> {
        self.list_parents_for_students_impl(student_ids).await
    }

    async fn is_parent_of(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        self.is_parent_of_impl(parent_id, student_id).await
    }

    // 表单模块
    async fn create_form(&self, form: NewPermissionForm) -> Result<PermissionForm> {
        self.create_form_impl(form).await
    }

    async fn get_form_by_id(&self, id: i64) -> Result<Option<PermissionForm>> {
        self.get_form_by_id_impl(id).await
    }

    async fn list_form_fields(&self, form_id: i64) -> Result<Vec<FormField>> {
        self.list_form_fields_impl(form_id).await
    }

    async fn list_forms_with_pagination(&self, query: FormListQuery) -> Result<FormListResponse> {
        self.list_forms_with_pagination_impl(query).await
    }

    async fn update_form(&self, id: i64, changes: FormChanges) -> Result<Option<PermissionForm>> {
        self.update_form_impl(id, changes).await
    }

    async fn transition_form_status(
        &self,
        id: i64,
        from: FormStatus,
        to: FormStatus,
        require_approved: bool,
    ) -> Result<bool> {
        self.transition_form_status_impl(id, from, to, require_approved)
            .await
    }

    async fn record_form_review(
        &self,
        id: i64,
        expected: &[ReviewStatus],
        status: ReviewStatus,
        comment: Option<String>,
        reviewer_id: Option<i64>,
    ) -> Result<bool> {
        self.record_form_review_impl(id, expected, status, comment, reviewer_id)
            .await
    }

    async fn delete_form(&self, id: i64) -> Result<bool> {
        self.delete_form_impl(id).await
    }

    async fn close_expired_forms(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>> {
        self.close_expired_forms_impl(now).await
    }

    async fn list_open_forms(&self, now: DateTime<Utc>) -> Result<Vec<PermissionForm>> {
        self.list_open_forms_impl(now).await
    }

    // 提交模块
    async fn create_submissions(
        &self,
        form_id: i64,
        student_ids: &[i64],
    ) -> Result<Vec<FormSubmission>> {
        self.create_submissions_impl(form_id, student_ids).await
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<FormSubmission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn list_form_submissions(&self, form_id: i64) -> Result<Vec<FormSubmission>> {
        self.list_form_submissions_impl(form_id).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    async fn list_parent_submissions(
        &self,
        parent_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<ParentSubmissionItem>> {
        self.list_parent_submissions_impl(parent_id, status).await
    }

    async fn record_submission_decision(
        &self,
        id: i64,
        decision: SubmissionDecision,
    ) -> Result<bool> {
        self.record_submission_decision_impl(id, decision).await
    }

    async fn get_form_stats(&self, form_id: i64) -> Result<FormStats> {
        self.get_form_stats_impl(form_id).await
    }

    async fn mark_submissions_reminded(&self, ids: &[i64], at: DateTime<Utc>) -> Result<u64> {
        self.mark_submissions_reminded_impl(ids, at).await
    }

    // 提醒模块
    async fn list_pending_reminders(&self, form_id: i64) -> Result<Vec<PendingReminder>> {
        self.list_pending_reminders_impl(form_id).await
    }

    async fn claim_reminder(
        &self,
        submission_id: i64,
        form_id: i64,
        offset_minutes: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.claim_reminder_impl(submission_id, form_id, offset_minutes, at)
            .await
    }

    async fn release_reminder(&self, submission_id: i64, offset_minutes: i64) -> Result<bool> {
        self.release_reminder_impl(submission_id, offset_minutes)
            .await
    }

    // 附件模块
    async fn create_document(&self, document: NewFormDocument) -> Result<FormDocument> {
        self.create_document_impl(document).await
    }

    async fn list_form_documents(&self, form_id: i64) -> Result<Vec<FormDocument>> {
        self.list_form_documents_impl(form_id).await
    }

    async fn get_document_by_id(&self, id: i64) -> Result<Option<FormDocument>> {
        self.get_document_by_id_impl(id).await
    }

    async fn get_document_by_token(&self, token: &str) -> Result<Option<FormDocument>> {
        self.get_document_by_token_impl(token).await
    }

    async fn delete_document(&self, id: i64) -> Result<bool> {
        self.delete_document_impl(id).await
    }

    // 共享模块
    async fn upsert_form_share(
        &self,
        form_id: i64,
        user_id: i64,
        permission: SharePermission,
        shared_by: i64,
    ) -> Result<FormShare> {
        self.upsert_form_share_impl(form_id, user_id, permission, shared_by)
            .await
    }

    async fn get_form_share(&self, form_id: i64, user_id: i64) -> Result<Option<FormShare>> {
        self.get_form_share_impl(form_id, user_id).await
    }

    async fn list_form_shares(&self, form_id: i64) -> Result<Vec<FormShareItem>> {
        self.list_form_shares_impl(form_id).await
    }

    async fn delete_form_share(&self, form_id: i64, user_id: i64) -> Result<bool> {
        self.delete_form_share_impl(form_id, user_id).await
    }

    // 审计模块
    async fn create_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog> {
        self.create_audit_log_impl(entry).await
    }

    async fn list_audit_logs_with_pagination(
        &self,
        query: AuditLogListQuery,
    ) -> Result<PaginatedResponse<AuditLog>> {
        self.list_audit_logs_with_pagination_impl(query).await
    }

    async fn ping(&self) -> Result<()> {
        self.ping_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("permission_please.db").unwrap(),
            "sqlite://permission_please.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert!(SeaOrmStorage::build_database_url("postgres://u:p@localhost/pp").is_ok());
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }
}
