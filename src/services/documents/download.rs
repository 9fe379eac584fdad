use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use tracing::error;

use super::{DocumentService, can_view_documents, stored_path};
use crate::errors::PermissionError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, not_found, storage_error};

pub async fn download_document(
    service: &DocumentService,
    token: String,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let document = match storage.get_document_by_token(&token).await {
        Ok(Some(document)) => document,
        Ok(None) => return Ok(not_found(ErrorCode::DocumentNotFound, "附件不存在")),
        Err(e) => return Ok(storage_error("下载附件", e)),
    };
    let form = match storage.get_form_by_id(document.form_id).await {
        Ok(Some(form)) => form,
        Ok(None) => return Ok(not_found(ErrorCode::DocumentNotFound, "附件不存在")),
        Err(e) => return Ok(storage_error("下载附件", e)),
    };

    match can_view_documents(storage.as_ref(), &user, &form).await {
        Ok(true) => {}
        Ok(false) => return Ok(not_found(ErrorCode::DocumentNotFound, "附件不存在")),
        Err(e) => return Ok(storage_error("下载附件", e)),
    }

    let content = match tokio::fs::read(stored_path(&document.stored_name)).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("附件 {} 的文件已丢失", document.id);
            return Ok(not_found(ErrorCode::DocumentNotFound, "附件文件不存在"));
        }
        Err(e) => {
            error!("{}", PermissionError::file_operation(format!("读取附件失败: {e}")));
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "读取附件失败",
            )));
        }
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, document.file_type.clone()))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.original_name),
        ))
        .body(content))
}
