//! SeaORM 存储层集成测试，默认使用内存 SQLite

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::collections::HashSet;

use permission_please::errors::{PermissionError, Result};
use permission_please::models::forms::entities::{FormStatus, ReviewStatus};
use permission_please::models::forms::requests::{
    DistributeFormRequest, FormChanges, NewPermissionForm,
};
use permission_please::models::schools::requests::CreateSchoolRequest;
use permission_please::models::students::requests::CreateStudentRequest;
use permission_please::models::submissions::entities::{FieldResponses, SubmissionStatus};
use permission_please::models::submissions::requests::SubmissionDecision;
use permission_please::models::users::entities::{User, UserRole};
use permission_please::models::users::requests::CreateUserRequest;
use permission_please::services::email::{EmailMessage, EmailSender, LogEmailSender};
use permission_please::services::reminders::cron::run_reminder_pass;
use permission_please::storage::Storage;
use permission_please::storage::sea_orm_storage::SeaOrmStorage;

async fn connect() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opt).await.expect("connect in-memory sqlite")
}

async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::from_connection(connect().await)
        .await
        .expect("run migrations")
}

/// 对指定收件人返回发送失败，其余转给日志发送器
struct RejectingSender {
    rejected: HashSet<String>,
    delivered: LogEmailSender,
}

impl RejectingSender {
    fn rejecting(addresses: &[&str]) -> Self {
        Self {
            rejected: addresses.iter().map(|a| a.to_string()).collect(),
            delivered: LogEmailSender::new(),
        }
    }
}

#[async_trait]
impl EmailSender for RejectingSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.rejected.contains(&message.to) {
            return Err(PermissionError::email(format!("mailbox unavailable: {}", message.to)));
        }
        self.delivered.send(message).await
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

async fn school(storage: &SeaOrmStorage, slug: &str) -> i64 {
    storage
        .create_school(CreateSchoolRequest {
            name: format!("School {slug}"),
            slug: slug.to_string(),
            require_form_review: false,
            reminder_schedule: None,
        })
        .await
        .expect("create school")
        .id
}

async fn user(storage: &SeaOrmStorage, school_id: i64, email: &str, role: UserRole) -> User {
    storage
        .create_user(CreateUserRequest {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            password: None,
            role,
            school_id: Some(school_id),
        })
        .await
        .expect("create user")
}

async fn student(storage: &SeaOrmStorage, school_id: i64, first: &str, grade: &str) -> i64 {
    storage
        .create_student(
            school_id,
            CreateStudentRequest {
                school_id: None,
                first_name: first.to_string(),
                last_name: "Okafor".to_string(),
                grade: grade.to_string(),
                group_name: None,
                external_id: None,
            },
        )
        .await
        .expect("create student")
        .id
}

async fn active_form(
    storage: &SeaOrmStorage,
    school_id: i64,
    teacher_id: i64,
    deadline: chrono::DateTime<Utc>,
    schedule: &[&str],
) -> i64 {
    let form = storage
        .create_form(NewPermissionForm {
            school_id,
            created_by: teacher_id,
            title: "Aquarium field trip".to_string(),
            description: None,
            event_date: None,
            event_type: Some("field_trip".to_string()),
            location: None,
            deadline,
            reminder_schedule: schedule.iter().map(|s| s.to_string()).collect(),
            fields: Vec::new(),
        })
        .await
        .expect("create form");
    let published = storage
        .transition_form_status(form.id, FormStatus::Draft, FormStatus::Active, false)
        .await
        .expect("publish form");
    assert!(published);
    form.id
}

#[tokio::test]
async fn test_distribution_never_duplicates_submissions() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let other_school = school(&storage, "birch").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;

    let ada = student(&storage, school_id, "Ada", "4").await;
    let ben = student(&storage, school_id, "Ben", "5").await;
    let outsider = student(&storage, other_school, "Cai", "4").await;

    let form_id = active_form(
        &storage,
        school_id,
        teacher.id,
        Utc::now() + Duration::days(7),
        &["1d"],
    )
    .await;

    let targets = DistributeFormRequest {
        student_ids: vec![outsider],
        grades: vec!["4".to_string()],
        ..Default::default()
    };
    let resolved = storage
        .resolve_students(school_id, &targets)
        .await
        .expect("resolve targets");
    let ids: Vec<i64> = resolved.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![ada]);

    let first = storage
        .create_submissions(form_id, &[ada, ben])
        .await
        .expect("first distribution");
    assert_eq!(first.len(), 2);

    let second = storage
        .create_submissions(form_id, &[ada, ben])
        .await
        .expect("second distribution");
    assert!(second.is_empty());
    assert_eq!(storage.list_form_submissions(form_id).await.expect("list").len(), 2);
}

#[tokio::test]
async fn test_decision_is_recorded_only_once() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let parent = user(&storage, school_id, "parent@example.com", UserRole::Parent).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    storage
        .link_parent(parent.id, ada, Some("mother".to_string()))
        .await
        .expect("link parent");

    let form_id = active_form(
        &storage,
        school_id,
        teacher.id,
        Utc::now() + Duration::days(7),
        &[],
    )
    .await;
    let submission = storage
        .create_submissions(form_id, &[ada])
        .await
        .expect("distribute")
        .remove(0);

    let sign = SubmissionDecision {
        parent_id: parent.id,
        status: SubmissionStatus::Signed,
        signature: Some("Grace Okafor".to_string()),
        decline_reason: None,
        responses: FieldResponses::new(),
    };
    assert!(storage
        .record_submission_decision(submission.id, sign.clone())
        .await
        .expect("sign"));

    let decline = SubmissionDecision {
        status: SubmissionStatus::Declined,
        signature: None,
        decline_reason: Some("changed my mind".to_string()),
        ..sign
    };
    assert!(!storage
        .record_submission_decision(submission.id, decline)
        .await
        .expect("second decision"));

    let stored = storage
        .get_submission_by_id(submission.id)
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(stored.status, SubmissionStatus::Signed);
    assert_eq!(stored.parent_id, Some(parent.id));
    assert!(stored.signed_at.is_some());
}

#[tokio::test]
async fn test_reminder_claim_is_idempotent() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    let form_id = active_form(
        &storage,
        school_id,
        teacher.id,
        Utc::now() + Duration::days(2),
        &["1d"],
    )
    .await;
    let submission = storage
        .create_submissions(form_id, &[ada])
        .await
        .expect("distribute")
        .remove(0);

    let now = Utc::now();
    assert!(storage.claim_reminder(submission.id, form_id, 1440, now).await.expect("claim"));
    assert!(!storage.claim_reminder(submission.id, form_id, 1440, now).await.expect("reclaim"));
    // 其他偏移量不受影响
    assert!(storage.claim_reminder(submission.id, form_id, 60, now).await.expect("claim 1h"));

    assert!(storage.release_reminder(submission.id, 1440).await.expect("release"));
    assert!(storage.claim_reminder(submission.id, form_id, 1440, now).await.expect("claim again"));
}

#[tokio::test]
async fn test_reminder_pass_sends_one_email_per_parent() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let parent = user(&storage, school_id, "parent@example.com", UserRole::Parent).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    let ben = student(&storage, school_id, "Ben", "2").await;
    for id in [ada, ben] {
        storage.link_parent(parent.id, id, None).await.expect("link parent");
    }

    let created = Utc::now();
    let deadline = created + Duration::hours(4);
    let form_id = active_form(&storage, school_id, teacher.id, deadline, &["2h"]).await;
    storage
        .create_submissions(form_id, &[ada, ben])
        .await
        .expect("distribute");

    let sender = LogEmailSender::new();

    // 还没到提醒时间
    let early = run_reminder_pass(&storage, &sender, created + Duration::minutes(30))
        .await
        .expect("early pass");
    assert_eq!(early.forms_scanned, 1);
    assert_eq!(early.reminders_sent, 0);

    let due_at = created + Duration::hours(3);
    let report = run_reminder_pass(&storage, &sender, due_at).await.expect("due pass");
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.reminders_failed, 0);
    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "parent@example.com");
    assert!(sent[0].text.contains("Ada Okafor"));
    assert!(sent[0].text.contains("Ben Okafor"));

    // 同一触发点不会重复发送
    let again = run_reminder_pass(&storage, &sender, due_at).await.expect("repeat pass");
    assert_eq!(again.reminders_sent, 0);
    assert_eq!(again.reminders_skipped, 2);
    assert_eq!(sender.sent().len(), 1);

    let reminded = storage.list_form_submissions(form_id).await.expect("list");
    assert!(reminded.iter().all(|s| s.last_reminded_at.is_some()));
}

#[tokio::test]
async fn test_reminder_pass_closes_expired_forms() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let deadline = Utc::now() + Duration::hours(1);
    let form_id = active_form(&storage, school_id, teacher.id, deadline, &["1d"]).await;

    let sender = LogEmailSender::new();
    let report = run_reminder_pass(&storage, &sender, deadline + Duration::minutes(1))
        .await
        .expect("pass");
    assert_eq!(report.forms_closed, 1);
    assert_eq!(report.forms_scanned, 0);

    let form = storage.get_form_by_id(form_id).await.expect("load").expect("exists");
    assert_eq!(form.status, FormStatus::Closed);
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("pp.db").display());

    let first = SeaOrmStorage::from_connection(Database::connect(&url).await.expect("connect"))
        .await
        .expect("migrate");
    let school_id = school(&first, "cedar").await;
    drop(first);

    // 迁移重复执行不报错，数据仍在
    let second = SeaOrmStorage::from_connection(Database::connect(&url).await.expect("reconnect"))
        .await
        .expect("migrate again");
    let loaded = second
        .get_school_by_id(school_id)
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(loaded.slug, "cedar");
}

#[tokio::test]
async fn test_failed_reminder_is_retried_next_pass() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let parent = user(&storage, school_id, "parent@example.com", UserRole::Parent).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    storage.link_parent(parent.id, ada, None).await.expect("link parent");

    let created = Utc::now();
    let deadline = created + Duration::hours(4);
    let form_id = active_form(&storage, school_id, teacher.id, deadline, &["2h"]).await;
    storage.create_submissions(form_id, &[ada]).await.expect("distribute");
    let due_at = created + Duration::hours(3);

    let failing = RejectingSender::rejecting(&["parent@example.com"]);
    let report = run_reminder_pass(&storage, &failing, due_at).await.expect("failing pass");
    assert_eq!(report.reminders_sent, 0);
    assert_eq!(report.reminders_failed, 1);
    let pending = storage.list_form_submissions(form_id).await.expect("list");
    assert!(pending[0].last_reminded_at.is_none());

    // 占用已释放，同一时刻重试可以发送
    let sender = LogEmailSender::new();
    let retry = run_reminder_pass(&storage, &sender, due_at).await.expect("retry pass");
    assert_eq!(retry.reminders_sent, 1);
    assert_eq!(retry.reminders_skipped, 0);
    assert_eq!(sender.sent().len(), 1);
    let reminded = storage.list_form_submissions(form_id).await.expect("list");
    assert!(reminded[0].last_reminded_at.is_some());
}

#[tokio::test]
async fn test_partial_delivery_keeps_claim() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let mother = user(&storage, school_id, "mother@example.com", UserRole::Parent).await;
    let father = user(&storage, school_id, "father@example.com", UserRole::Parent).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    for parent in [&mother, &father] {
        storage.link_parent(parent.id, ada, None).await.expect("link parent");
    }

    let created = Utc::now();
    let deadline = created + Duration::hours(4);
    let form_id = active_form(&storage, school_id, teacher.id, deadline, &["2h"]).await;
    storage.create_submissions(form_id, &[ada]).await.expect("distribute");
    let due_at = created + Duration::hours(3);

    let sender = RejectingSender::rejecting(&["father@example.com"]);
    let report = run_reminder_pass(&storage, &sender, due_at).await.expect("pass");
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.reminders_failed, 1);

    // 至少一位家长已收到，不再重发
    let again = run_reminder_pass(&storage, &LogEmailSender::new(), due_at)
        .await
        .expect("repeat pass");
    assert_eq!(again.reminders_sent, 0);
    assert_eq!(again.reminders_skipped, 1);
    let reminded = storage.list_form_submissions(form_id).await.expect("list");
    assert!(reminded[0].last_reminded_at.is_some());
}

#[tokio::test]
async fn test_claim_error_does_not_strand_other_reminders() {
    let db = connect().await;
    let storage = SeaOrmStorage::from_connection(db.clone())
        .await
        .expect("run migrations");
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let ada_parent = user(&storage, school_id, "ada.parent@example.com", UserRole::Parent).await;
    let ben_parent = user(&storage, school_id, "ben.parent@example.com", UserRole::Parent).await;
    let ada = student(&storage, school_id, "Ada", "4").await;
    let ben = student(&storage, school_id, "Ben", "4").await;
    storage.link_parent(ada_parent.id, ada, None).await.expect("link ada");
    storage.link_parent(ben_parent.id, ben, None).await.expect("link ben");

    let created = Utc::now();
    let deadline = created + Duration::hours(4);
    let form_id = active_form(&storage, school_id, teacher.id, deadline, &["2h"]).await;
    let submissions = storage
        .create_submissions(form_id, &[ada, ben])
        .await
        .expect("distribute");
    let ben_submission = submissions
        .iter()
        .find(|s| s.student_id == ben)
        .expect("ben submission")
        .id;
    let due_at = created + Duration::hours(3);

    // Ben 的提醒记录写入失败
    db.execute_unprepared(&format!(
        "CREATE TRIGGER fail_claim BEFORE INSERT ON reminder_logs \
         WHEN NEW.submission_id = {ben_submission} \
         BEGIN SELECT RAISE(ABORT, 'disk unavailable'); END;"
    ))
    .await
    .expect("create trigger");

    let sender = LogEmailSender::new();
    let report = run_reminder_pass(&storage, &sender, due_at).await.expect("pass");
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.reminders_failed, 1);
    assert_eq!(sender.sent()[0].to, "ada.parent@example.com");

    db.execute_unprepared("DROP TRIGGER fail_claim")
        .await
        .expect("drop trigger");

    let retry = run_reminder_pass(&storage, &sender, due_at).await.expect("retry pass");
    assert_eq!(retry.reminders_sent, 1);
    assert_eq!(retry.reminders_skipped, 1);
    let sent = sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, "ben.parent@example.com");
}

#[tokio::test]
async fn test_review_decision_applies_once() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let first_reviewer = user(&storage, school_id, "head@maple.edu", UserRole::Reviewer).await;
    let second_reviewer = user(&storage, school_id, "deputy@maple.edu", UserRole::Reviewer).await;
    let form = storage
        .create_form(NewPermissionForm {
            school_id,
            created_by: teacher.id,
            title: "Overnight camp".to_string(),
            description: None,
            event_date: None,
            event_type: None,
            location: None,
            deadline: Utc::now() + Duration::days(3),
            reminder_schedule: Vec::new(),
            fields: Vec::new(),
        })
        .await
        .expect("create form");

    // 未审核通过时不能发布
    assert!(!storage
        .transition_form_status(form.id, FormStatus::Draft, FormStatus::Active, true)
        .await
        .expect("publish unreviewed"));

    let submitted = storage
        .record_form_review(
            form.id,
            &[ReviewStatus::None, ReviewStatus::Rejected],
            ReviewStatus::Pending,
            None,
            None,
        )
        .await
        .expect("submit review");
    assert!(submitted);

    let first = storage
        .record_form_review(form.id, &[ReviewStatus::Pending], ReviewStatus::Approved, None, Some(first_reviewer.id))
        .await
        .expect("approve");
    let second = storage
        .record_form_review(
            form.id,
            &[ReviewStatus::Pending],
            ReviewStatus::Rejected,
            Some("too late".to_string()),
            Some(second_reviewer.id),
        )
        .await
        .expect("reject");
    assert!(first);
    assert!(!second);

    let reviewed = storage.get_form_by_id(form.id).await.expect("load").expect("exists");
    assert_eq!(reviewed.review_status, ReviewStatus::Approved);
    assert_eq!(reviewed.reviewed_by, Some(first_reviewer.id));

    // 编辑重置审核后，按旧快照发布会失败
    storage
        .update_form(
            form.id,
            FormChanges {
                expected_status: Some(FormStatus::Draft),
                title: Some("Overnight camp (updated)".to_string()),
                review_status: Some(ReviewStatus::None),
                ..Default::default()
            },
        )
        .await
        .expect("edit draft");
    assert!(!storage
        .transition_form_status(form.id, FormStatus::Draft, FormStatus::Active, true)
        .await
        .expect("publish after reset"));
    let current = storage.get_form_by_id(form.id).await.expect("load").expect("exists");
    assert_eq!(current.status, FormStatus::Draft);
}

#[tokio::test]
async fn test_edit_fails_when_status_changed() {
    let storage = storage().await;
    let school_id = school(&storage, "maple").await;
    let teacher = user(&storage, school_id, "teacher@maple.edu", UserRole::Teacher).await;
    let form_id = active_form(
        &storage,
        school_id,
        teacher.id,
        Utc::now() + Duration::days(3),
        &["1d"],
    )
    .await;

    // 以草稿为前提的编辑遇到已发布的表单
    let err = storage
        .update_form(
            form_id,
            FormChanges {
                expected_status: Some(FormStatus::Draft),
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let form = storage.get_form_by_id(form_id).await.expect("load").expect("exists");
    assert_eq!(form.title, "Aquarium field trip");

    // 已关闭的表单不能再关闭
    assert!(storage
        .transition_form_status(form_id, FormStatus::Active, FormStatus::Closed, false)
        .await
        .expect("close"));
    assert!(!storage
        .transition_form_status(form_id, FormStatus::Active, FormStatus::Closed, false)
        .await
        .expect("close twice"));
}
