//! 签署提醒
//!
//! 定时入口（cron 或进程内调度器）按表单计划发送提醒；
//! 表单管理者也可以随时手动提醒所有未签署的家长。

pub mod cron;
pub mod manual;
pub mod schedule;
pub mod scheduler;

pub use schedule::ReminderSchedule;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::services::{EmailSender, app_state};
use crate::storage::Storage;

pub struct ReminderService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReminderService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => app_state::<dyn Storage>(request),
        }
    }

    pub(crate) fn get_email_sender(
        &self,
        request: &HttpRequest,
    ) -> ActixResult<Arc<dyn EmailSender>> {
        app_state::<dyn EmailSender>(request)
    }

    pub async fn run_cron(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        cron::handle_cron(self, request).await
    }

    pub async fn remind_form(&self, form_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        manual::remind_form(self, form_id, request).await
    }
}
