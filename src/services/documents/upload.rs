use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{DocumentService, file_extension, sanitize_file_name, stored_path};
use crate::config::AppConfig;
use crate::errors::PermissionError;
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, documents::entities::NewFormDocument,
};
use crate::services::forms::access::{FormAccess, load_form};
use crate::services::{audit, bad_request, current_user, error_response, storage_error};
use crate::utils::file_magic::content_type_for;
use crate::utils::token::generate_token;
use crate::utils::validate_magic_bytes;

/// 上传内容缓冲，读完后再整体校验
struct UploadBuffer {
    data: Vec<u8>,
    max_size: usize,
}

impl UploadBuffer {
    fn new(max_size: usize) -> Self {
        Self {
            data: Vec::new(),
            max_size,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), (ErrorCode, &'static str)> {
        if self.data.len() + chunk.len() > self.max_size {
            return Err((ErrorCode::FileSizeExceeded, "文件大小超过限制"));
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// 魔术字节与文本的 NUL 检查都基于完整内容，不受分块大小影响
    fn finish(self, extension: &str) -> Result<Vec<u8>, (ErrorCode, &'static str)> {
        if self.data.is_empty() {
            return Err((ErrorCode::FileUploadFailed, "文件内容为空"));
        }
        if !validate_magic_bytes(&self.data, extension) {
            return Err((ErrorCode::FileTypeNotAllowed, "文件内容与扩展名不匹配"));
        }
        Ok(self.data)
    }
}

fn upload_failed(message: &str) -> HttpResponse {
    error_response(
        actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::FileUploadFailed,
        message,
    )
}

pub async fn upload_document(
    service: &DocumentService,
    form_id: i64,
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) =
        match load_form(storage.as_ref(), &actor, form_id, FormAccess::Manage, "上传附件").await {
            Ok(found) => found,
            Err(resp) => return Ok(resp),
        };

    let config = &AppConfig::get().upload;

    let mut original_name = String::new();
    let mut extension = String::new();
    let mut content: Option<Vec<u8>> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }
        if content.is_some() {
            return Ok(bad_request(
                ErrorCode::MultifileUploadNotAllowed,
                "一次只能上传一个文件",
            ));
        }

        original_name = sanitize_file_name(
            content_disposition
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default(),
        );
        extension = file_extension(&original_name);
        if !config
            .allowed_types
            .iter()
            .any(|t| t.to_lowercase() == extension)
        {
            return Ok(bad_request(ErrorCode::FileTypeNotAllowed, "不允许的文件类型"));
        }

        let mut buffer = UploadBuffer::new(config.max_size);
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if let Err((code, msg)) = buffer.push(&chunk) {
                return Ok(bad_request(code, msg));
            }
        }
        match buffer.finish(&extension) {
            Ok(data) => content = Some(data),
            Err((code, msg)) => return Ok(bad_request(code, msg)),
        }
    }

    let data = match content {
        Some(data) => data,
        None => return Ok(bad_request(ErrorCode::FileUploadFailed, "请求中没有 file 字段")),
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.dir).await {
        error!("{}", PermissionError::file_operation(format!("创建上传目录失败: {e}")));
        return Ok(upload_failed("创建上传目录失败"));
    }

    // 磁盘文件名与下载令牌都是随机值，和原始文件名无关
    let stored_name = format!("{}{}", Uuid::new_v4().simple(), extension);
    let path = stored_path(&stored_name);
    if let Err(e) = tokio::fs::write(&path, &data).await {
        error!("{}", PermissionError::file_operation(format!("写入附件失败: {e}")));
        return Ok(upload_failed("文件保存失败"));
    }

    let document = NewFormDocument {
        form_id: form.id,
        uploaded_by: actor.id,
        original_name,
        stored_name,
        file_size: data.len() as i64,
        file_type: content_type_for(&extension).to_string(),
        download_token: generate_token(),
    };
    let created = match storage.create_document(document).await {
        Ok(created) => created,
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(storage_error("上传附件", e));
        }
    };

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("document.upload", "document", Some(created.id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({
                "form_id": form.id,
                "file_name": created.original_name,
                "file_size": created.file_size,
            })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(created, "附件上传成功")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn fill(chunks: &[&[u8]], max_size: usize) -> UploadBuffer {
        let mut buffer = UploadBuffer::new(max_size);
        for chunk in chunks {
            buffer.push(chunk).expect("within limit");
        }
        buffer
    }

    #[test]
    fn test_signature_split_across_chunks() {
        let buffer = fill(&[&PNG[..3], &PNG[3..], b"IHDR"], 1024);
        assert_eq!(buffer.finish(".png").expect("valid png").len(), 12);
    }

    #[test]
    fn test_nul_in_later_chunk_is_rejected() {
        let buffer = fill(&[b"Bring a packed lunch.", &[0x41, 0x00]], 1024);
        let (code, _) = buffer.finish(".txt").unwrap_err();
        assert_eq!(code, ErrorCode::FileTypeNotAllowed);
    }

    #[test]
    fn test_size_limit_counts_all_chunks() {
        let mut buffer = UploadBuffer::new(10);
        buffer.push(b"%PDF-1.7").expect("first chunk");
        let (code, _) = buffer.push(b"abc").unwrap_err();
        assert_eq!(code, ErrorCode::FileSizeExceeded);
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let (code, _) = UploadBuffer::new(10).finish(".pdf").unwrap_err();
        assert_eq!(code, ErrorCode::FileUploadFailed);
    }
}
