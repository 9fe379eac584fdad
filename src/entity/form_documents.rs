//! 表单附件实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "form_documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub form_id: i64,
    pub uploaded_by: i64,
    pub original_name: String,
    pub stored_name: String,
    pub file_size: i64,
    pub file_type: String,
    #[sea_orm(unique)]
    pub download_token: String,
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
}

impl Related<super::permission_forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_document(self) -> crate::models::documents::entities::FormDocument {
        crate::models::documents::entities::FormDocument {
            id: self.id,
            form_id: self.form_id,
            uploaded_by: self.uploaded_by,
            original_name: self.original_name,
            stored_name: self.stored_name,
            file_size: self.file_size,
            file_type: self.file_type,
            download_token: self.download_token,
            created_at: super::to_datetime(self.created_at),
        }
    }
}
