pub mod access;
pub mod create;
pub mod delete;
pub mod detail;
pub mod distribute;
pub mod distribution;
pub mod export;
pub mod lifecycle;
pub mod list;
pub mod review;
pub mod shares;
pub mod stats;
pub mod update;
pub mod validation;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::{
    forms::requests::{
        CreateFormRequest, DistributeFormRequest, FormListParams, ReviewFormRequest,
        UpdateFormRequest,
    },
    shares::requests::ShareFormRequest,
};
use crate::services::{EmailSender, app_state};
use crate::storage::Storage;

pub struct FormService {
    storage: Option<Arc<dyn Storage>>,
}

impl FormService {
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

    pub async fn list_forms(
        &self,
        params: FormListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_forms(self, params, request).await
    }

    pub async fn create_form(
        &self,
        form: CreateFormRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_form(self, form, request).await
    }

    pub async fn get_form(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        detail::get_form(self, id, request).await
    }

    pub async fn update_form(
        &self,
        id: i64,
        update: UpdateFormRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_form(self, id, update, request).await
    }

    pub async fn delete_form(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_form(self, id, request).await
    }

    pub async fn publish_form(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        lifecycle::publish_form(self, id, request).await
    }

    pub async fn close_form(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        lifecycle::close_form(self, id, request).await
    }

    pub async fn reopen_form(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        lifecycle::reopen_form(self, id, request).await
    }

    pub async fn submit_for_review(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::submit_for_review(self, id, request).await
    }

    pub async fn review_form(
        &self,
        id: i64,
        decision: ReviewFormRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::review_form(self, id, decision, request).await
    }

    pub async fn get_form_stats(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        stats::get_form_stats(self, id, request).await
    }

    pub async fn export_submissions(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        export::export_submissions(self, id, request).await
    }

    pub async fn list_shares(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        shares::list_shares(self, id, request).await
    }

    pub async fn share_form(
        &self,
        id: i64,
        share: ShareFormRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        shares::share_form(self, id, share, request).await
    }

    pub async fn remove_share(
        &self,
        id: i64,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        shares::remove_share(self, id, user_id, request).await
    }

    pub async fn distribute_form(
        &self,
        id: i64,
        targets: DistributeFormRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        distribute::distribute_form(self, id, targets, request).await
    }
}
