//! 表单提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "form_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub form_id: i64,
    pub student_id: i64,
    pub parent_id: Option<i64>,
    pub status: String,
    pub signature: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub decline_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub responses: Option<String>,
    pub signed_at: Option<i64>,
    pub last_reminded_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::permission_forms::Entity",
        from = "Column::FormId",
        to = "super::permission_forms::Column::Id"
    )]
    Form,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ParentId",
        to = "super::users::Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::reminder_logs::Entity")]
    ReminderLogs,
}

impl Related<super::permission_forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl Related<super::reminder_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReminderLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::FormSubmission {
        use crate::models::submissions::entities::{FormSubmission, SubmissionStatus};

        FormSubmission {
            id: self.id,
            form_id: self.form_id,
            student_id: self.student_id,
            parent_id: self.parent_id,
            status: self.status.parse().unwrap_or(SubmissionStatus::Pending),
            signature: self.signature,
            decline_reason: self.decline_reason,
            responses: self
                .responses
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            signed_at: self.signed_at.map(super::to_datetime),
            last_reminded_at: self.last_reminded_at.map(super::to_datetime),
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
