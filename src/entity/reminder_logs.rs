//! 提醒记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reminder_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub form_id: i64,
    pub offset_minutes: i64,
    pub sent_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::form_submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::form_submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::form_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_reminder_log(self) -> crate::models::reminders::entities::ReminderLog {
        crate::models::reminders::entities::ReminderLog {
            id: self.id,
            submission_id: self.submission_id,
            form_id: self.form_id,
            offset_minutes: self.offset_minutes,
            sent_at: super::to_datetime(self.sent_at),
        }
    }
}
