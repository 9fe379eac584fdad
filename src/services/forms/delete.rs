use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::warn;

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog, forms::entities::FormStatus};
use crate::services::{audit, conflict, current_user, not_found, storage_error};

pub async fn delete_form(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &actor, id, FormAccess::Owner, "删除表单").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    // 只有草稿可以删除，管理员不受限制
    if form.status != FormStatus::Draft && !actor.is_admin() {
        return Ok(conflict(ErrorCode::FormInvalidState, "只能删除草稿状态的表单"));
    }

    // 行删除后附件文件不再可达，先记下存储名
    let stored_files: Vec<String> = match storage.list_form_documents(id).await {
        Ok(docs) => docs.into_iter().map(|d| d.stored_name).collect(),
        Err(e) => return Ok(storage_error("删除表单", e)),
    };

    match storage.delete_form(id).await {
        Ok(true) => {
            let upload_dir = std::path::Path::new(&AppConfig::get().upload.dir);
            for stored_name in &stored_files {
                if let Err(e) = tokio::fs::remove_file(upload_dir.join(stored_name)).await {
                    warn!("删除附件文件 {} 失败: {}", stored_name, e);
                }
            }
            audit::record(
                storage.as_ref(),
                Some(request),
                NewAuditLog::new("form.delete", "form", Some(id))
                    .school(Some(form.school_id))
                    .actor(actor.id)
                    .details(json!({ "title": form.title, "status": form.status })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("表单删除成功")))
        }
        Ok(false) => Ok(not_found(ErrorCode::FormNotFound, "表单不存在")),
        Err(e) => Ok(storage_error("删除表单", e)),
    }
}
