//! 表单共享实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "form_shares")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub form_id: i64,
    pub user_id: i64,
    pub permission: String,
    pub shared_by: i64,
    pub created_at: i64,
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
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::permission_forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_share(self) -> crate::models::shares::entities::FormShare {
        use crate::models::shares::entities::{FormShare, SharePermission};

        FormShare {
            id: self.id,
            form_id: self.form_id,
            user_id: self.user_id,
            permission: self.permission.parse().unwrap_or(SharePermission::View),
            shared_by: self.shared_by,
            created_at: super::to_datetime(self.created_at),
        }
    }
}
