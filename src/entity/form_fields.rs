//! 表单字段实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "form_fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub form_id: i64,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub options: Option<String>,
    pub position: i32,
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
    pub fn into_field(self) -> crate::models::forms::entities::FormField {
        use crate::models::forms::entities::{FieldType, FormField};

        FormField {
            id: self.id,
            form_id: self.form_id,
            label: self.label,
            field_type: self.field_type.parse().unwrap_or(FieldType::Text),
            required: self.required,
            options: super::parse_string_list(self.options.as_deref()),
            position: self.position,
        }
    }
}
