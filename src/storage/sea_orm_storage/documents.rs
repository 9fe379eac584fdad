//! 表单附件存储操作

use super::{SeaOrmStorage, write_error};
use crate::entity::form_documents::{ActiveModel, Column, Entity as FormDocuments};
use crate::errors::{PermissionError, Result};
use crate::models::documents::entities::{FormDocument, NewFormDocument};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 保存附件信息
    pub async fn create_document_impl(&self, doc: NewFormDocument) -> Result<FormDocument> {
        let model = ActiveModel {
            form_id: Set(doc.form_id),
            uploaded_by: Set(doc.uploaded_by),
            original_name: Set(doc.original_name),
            stored_name: Set(doc.stored_name),
            file_size: Set(doc.file_size),
            file_type: Set(doc.file_type),
            download_token: Set(doc.download_token),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(write_error("保存附件信息失败"))?;

        Ok(result.into_document())
    }

    /// 表单附件列表
    pub async fn list_form_documents_impl(&self, form_id: i64) -> Result<Vec<FormDocument>> {
        let docs = FormDocuments::find()
            .filter(Column::FormId.eq(form_id))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询附件失败: {e}")))?;

        Ok(docs.into_iter().map(|m| m.into_document()).collect())
    }

    pub async fn get_document_by_id_impl(&self, id: i64) -> Result<Option<FormDocument>> {
        let result = FormDocuments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询附件失败: {e}")))?;

        Ok(result.map(|m| m.into_document()))
    }

    /// 通过下载令牌获取附件
    pub async fn get_document_by_token_impl(&self, token: &str) -> Result<Option<FormDocument>> {
        let result = FormDocuments::find()
            .filter(Column::DownloadToken.eq(token))
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询附件失败: {e}")))?;

        Ok(result.map(|m| m.into_document()))
    }

    pub async fn delete_document_impl(&self, id: i64) -> Result<bool> {
        let result = FormDocuments::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除附件失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
