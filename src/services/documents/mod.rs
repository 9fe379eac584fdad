pub mod delete;
pub mod download;
pub mod list;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{forms::entities::PermissionForm, users::entities::{User, UserRole}};
use crate::services::app_state;
use crate::services::forms::access::form_access;
use crate::storage::Storage;

pub struct DocumentService {
    storage: Option<Arc<dyn Storage>>,
}

impl DocumentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => app_state::<dyn Storage>(request),
        }
    }

    pub async fn upload_document(
        &self,
        form_id: i64,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        upload::upload_document(self, form_id, payload, request).await
    }

    pub async fn list_documents(
        &self,
        form_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_documents(self, form_id, request).await
    }

    pub async fn download_document(
        &self,
        token: String,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        download::download_document(self, token, request).await
    }

    pub async fn delete_document(
        &self,
        form_id: i64,
        document_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_document(self, form_id, document_id, request).await
    }
}

/// 表单读者可以查看附件；家长需要在该表单上有自己学生的提交
pub(crate) async fn can_view_documents(
    storage: &dyn Storage,
    user: &User,
    form: &PermissionForm,
) -> crate::errors::Result<bool> {
    if user.role == UserRole::Parent {
        let items = storage.list_parent_submissions(user.id, None).await?;
        return Ok(items.iter().any(|item| item.form.id == form.id));
    }
    Ok(form_access(storage, user, form).await?.can_read())
}

/// 附件在磁盘上的位置
pub(crate) fn stored_path(stored_name: &str) -> PathBuf {
    Path::new(&AppConfig::get().upload.dir).join(stored_name)
}

/// 小写且带点号的扩展名，没有扩展名时返回空串
pub(crate) fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// 客户端文件名只保留最后一段，去掉控制字符与引号
pub(crate) fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .take(255)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_is_lowercased() {
        assert_eq!(file_extension("Trip Itinerary.PDF"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
    }

    #[test]
    fn test_sanitize_file_name_strips_paths() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\kim\\map.png"), "map.png");
        assert_eq!(sanitize_file_name("say \"hi\".txt"), "say hi.txt");
        assert_eq!(sanitize_file_name("   "), "document");
    }
}
