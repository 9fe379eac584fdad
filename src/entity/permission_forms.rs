//! 许可表单实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "permission_forms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub school_id: i64,
    pub created_by: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub event_date: Option<i64>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub deadline: i64,
    pub status: String,
    pub review_status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_comment: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<i64>,
    #[sea_orm(column_type = "Text")]
    pub reminder_schedule: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schools::Entity",
        from = "Column::SchoolId",
        to = "super::schools::Column::Id"
    )]
    School,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::form_fields::Entity")]
    Fields,
    #[sea_orm(has_many = "super::form_submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::form_shares::Entity")]
    Shares,
}

impl Related<super::schools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::form_fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::form_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::form_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_form(self) -> crate::models::forms::entities::PermissionForm {
        use crate::models::forms::entities::{FormStatus, PermissionForm, ReviewStatus};

        PermissionForm {
            id: self.id,
            school_id: self.school_id,
            created_by: self.created_by,
            title: self.title,
            description: self.description,
            event_date: self.event_date.map(super::to_datetime),
            event_type: self.event_type,
            location: self.location,
            deadline: super::to_datetime(self.deadline),
            status: self.status.parse().unwrap_or(FormStatus::Draft),
            review_status: self.review_status.parse().unwrap_or(ReviewStatus::None),
            review_comment: self.review_comment,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at.map(super::to_datetime),
            reminder_schedule: super::parse_string_list(Some(&self.reminder_schedule)),
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
