use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::warn;

use super::{DocumentService, stored_path};
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::forms::access::{FormAccess, load_form};
use crate::services::{audit, current_user, not_found, storage_error};

pub async fn delete_document(
    service: &DocumentService,
    form_id: i64,
    document_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) =
        match load_form(storage.as_ref(), &actor, form_id, FormAccess::Manage, "删除附件").await {
            Ok(found) => found,
            Err(resp) => return Ok(resp),
        };

    let document = match storage.get_document_by_id(document_id).await {
        Ok(Some(document)) if document.form_id == form.id => document,
        Ok(_) => return Ok(not_found(ErrorCode::DocumentNotFound, "附件不存在")),
        Err(e) => return Ok(storage_error("删除附件", e)),
    };

    match storage.delete_document(document.id).await {
        Ok(true) => {}
        Ok(false) => return Ok(not_found(ErrorCode::DocumentNotFound, "附件不存在")),
        Err(e) => return Ok(storage_error("删除附件", e)),
    }

    if let Err(e) = tokio::fs::remove_file(stored_path(&document.stored_name)).await {
        warn!("删除附件文件 {} 失败: {}", document.stored_name, e);
    }

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("document.delete", "document", Some(document.id))
            .school(Some(form.school_id))
            .actor(actor.id)
            .details(json!({ "form_id": form.id, "file_name": document.original_name })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("附件删除成功")))
}
