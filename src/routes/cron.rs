use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::ReminderService;

// 懒加载的全局 ReminderService 实例
static REMINDER_SERVICE: Lazy<ReminderService> = Lazy::new(ReminderService::new_lazy);

pub async fn run_reminders(request: HttpRequest) -> ActixResult<HttpResponse> {
    REMINDER_SERVICE.run_cron(&request).await
}

// 配置路由，由外部调度器携带 cron 密钥调用
pub fn configure_cron_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/cron")
            .wrap(middlewares::RequireCronSecret::new())
            .route("/reminders", web::post().to(run_reminders)),
    );
}
