use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_tables::{Schools, Students, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 许可表单表 ====================
        manager
            .create_table(
                Table::create()
                    .table(PermissionForms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PermissionForms::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::SchoolId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PermissionForms::Title).string().not_null())
                    .col(ColumnDef::new(PermissionForms::Description).text().null())
                    .col(ColumnDef::new(PermissionForms::EventDate).big_integer().null())
                    .col(ColumnDef::new(PermissionForms::EventType).string().null())
                    .col(ColumnDef::new(PermissionForms::Location).string().null())
                    .col(
                        ColumnDef::new(PermissionForms::Deadline)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PermissionForms::Status).string().not_null())
                    .col(
                        ColumnDef::new(PermissionForms::ReviewStatus)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PermissionForms::ReviewComment).text().null())
                    .col(
                        ColumnDef::new(PermissionForms::ReviewedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::ReviewedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::ReminderSchedule)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PermissionForms::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PermissionForms::Table, PermissionForms::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PermissionForms::Table, PermissionForms::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 表单字段表 ====================
        manager
            .create_table(
                Table::create()
                    .table(FormFields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormFields::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormFields::FormId).big_integer().not_null())
                    .col(ColumnDef::new(FormFields::Label).string().not_null())
                    .col(ColumnDef::new(FormFields::FieldType).string().not_null())
                    .col(
                        ColumnDef::new(FormFields::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FormFields::Options).text().null())
                    .col(ColumnDef::new(FormFields::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormFields::Table, FormFields::FormId)
                            .to(PermissionForms::Table, PermissionForms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 表单签署记录表 ====================
        manager
            .create_table(
                Table::create()
                    .table(FormSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormSubmissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::FormId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FormSubmissions::ParentId).big_integer().null())
                    .col(ColumnDef::new(FormSubmissions::Status).string().not_null())
                    .col(ColumnDef::new(FormSubmissions::Signature).string().null())
                    .col(ColumnDef::new(FormSubmissions::DeclineReason).text().null())
                    .col(ColumnDef::new(FormSubmissions::Responses).text().null())
                    .col(ColumnDef::new(FormSubmissions::SignedAt).big_integer().null())
                    .col(
                        ColumnDef::new(FormSubmissions::LastRemindedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormSubmissions::Table, FormSubmissions::FormId)
                            .to(PermissionForms::Table, PermissionForms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormSubmissions::Table, FormSubmissions::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormSubmissions::Table, FormSubmissions::ParentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 表单附件表 ====================
        manager
            .create_table(
                Table::create()
                    .table(FormDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormDocuments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormDocuments::FormId).big_integer().not_null())
                    .col(
                        ColumnDef::new(FormDocuments::UploadedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FormDocuments::OriginalName).string().not_null())
                    .col(ColumnDef::new(FormDocuments::StoredName).string().not_null())
                    .col(ColumnDef::new(FormDocuments::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(FormDocuments::FileType).string().not_null())
                    .col(
                        ColumnDef::new(FormDocuments::DownloadToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(FormDocuments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormDocuments::Table, FormDocuments::FormId)
                            .to(PermissionForms::Table, PermissionForms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 表单共享表 ====================
        manager
            .create_table(
                Table::create()
                    .table(FormShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormShares::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormShares::FormId).big_integer().not_null())
                    .col(ColumnDef::new(FormShares::UserId).big_integer().not_null())
                    .col(ColumnDef::new(FormShares::Permission).string().not_null())
                    .col(ColumnDef::new(FormShares::SharedBy).big_integer().not_null())
                    .col(ColumnDef::new(FormShares::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormShares::Table, FormShares::FormId)
                            .to(PermissionForms::Table, PermissionForms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FormShares::Table, FormShares::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 提醒记录表 ====================
        manager
            .create_table(
                Table::create()
                    .table(ReminderLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReminderLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReminderLogs::FormId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ReminderLogs::OffsetMinutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReminderLogs::SentAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderLogs::Table, ReminderLogs::SubmissionId)
                            .to(FormSubmissions::Table, FormSubmissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderLogs::Table, ReminderLogs::FormId)
                            .to(PermissionForms::Table, PermissionForms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_permission_forms_school_status")
                    .table(PermissionForms::Table)
                    .col(PermissionForms::SchoolId)
                    .col(PermissionForms::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_permission_forms_deadline")
                    .table(PermissionForms::Table)
                    .col(PermissionForms::Deadline)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_form_fields_form_id")
                    .table(FormFields::Table)
                    .col(FormFields::FormId)
                    .to_owned(),
            )
            .await?;

        // 同一学生在同一表单上只能有一条签署记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_form_submissions_form_student")
                    .table(FormSubmissions::Table)
                    .col(FormSubmissions::FormId)
                    .col(FormSubmissions::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_form_submissions_status")
                    .table(FormSubmissions::Table)
                    .col(FormSubmissions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_form_shares_form_user")
                    .table(FormShares::Table)
                    .col(FormShares::FormId)
                    .col(FormShares::UserId)
                    .to_owned(),
            )
            .await?;

        // 同一提醒档位只发送一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_reminder_logs_submission_offset")
                    .table(ReminderLogs::Table)
                    .col(ReminderLogs::SubmissionId)
                    .col(ReminderLogs::OffsetMinutes)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReminderLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormSubmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormFields::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PermissionForms::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum PermissionForms {
    #[sea_orm(iden = "permission_forms")]
    Table,
    Id,
    SchoolId,
    CreatedBy,
    Title,
    Description,
    EventDate,
    EventType,
    Location,
    Deadline,
    Status,
    ReviewStatus,
    ReviewComment,
    ReviewedBy,
    ReviewedAt,
    ReminderSchedule,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FormFields {
    #[sea_orm(iden = "form_fields")]
    Table,
    Id,
    FormId,
    Label,
    FieldType,
    Required,
    Options,
    Position,
}

#[derive(DeriveIden)]
enum FormSubmissions {
    #[sea_orm(iden = "form_submissions")]
    Table,
    Id,
    FormId,
    StudentId,
    ParentId,
    Status,
    Signature,
    DeclineReason,
    Responses,
    SignedAt,
    LastRemindedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FormDocuments {
    #[sea_orm(iden = "form_documents")]
    Table,
    Id,
    FormId,
    UploadedBy,
    OriginalName,
    StoredName,
    FileSize,
    FileType,
    DownloadToken,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FormShares {
    #[sea_orm(iden = "form_shares")]
    Table,
    Id,
    FormId,
    UserId,
    Permission,
    SharedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReminderLogs {
    #[sea_orm(iden = "reminder_logs")]
    Table,
    Id,
    SubmissionId,
    FormId,
    OffsetMinutes,
    SentAt,
}
