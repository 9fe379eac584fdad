use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::DocumentService;
use crate::utils::SafeDownloadToken;

// 懒加载的全局 DocumentService 实例
static DOCUMENT_SERVICE: Lazy<DocumentService> = Lazy::new(DocumentService::new_lazy);

pub async fn download_document(
    request: HttpRequest,
    token: SafeDownloadToken,
) -> ActixResult<HttpResponse> {
    DOCUMENT_SERVICE.download_document(token.0, &request).await
}

// 配置路由，上传与删除挂在表单路由下
pub fn configure_document_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/documents")
            .wrap(middlewares::RequireJWT)
            .wrap(middleware::Compress::default())
            .route("/{token}", web::get().to(download_document)),
    );
}
