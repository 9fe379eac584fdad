pub mod decide;
pub mod detail;
pub mod list;
pub mod responses;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::submissions::requests::{
    DeclineSubmissionRequest, MySubmissionParams, SignSubmissionRequest, SubmissionListParams,
};
use crate::services::{EmailSender, app_state};
use crate::storage::Storage;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubmissionService {
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

    /// 家长名下学生的提交
    pub async fn list_my_submissions(
        &self,
        params: MySubmissionParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_my_submissions(self, params, request).await
    }

    /// 表单的提交列表
    pub async fn list_form_submissions(
        &self,
        form_id: i64,
        params: SubmissionListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_form_submissions(self, form_id, params, request).await
    }

    pub async fn get_submission(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        detail::get_submission(self, id, request).await
    }

    pub async fn sign_submission(
        &self,
        id: i64,
        sign: SignSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        decide::sign_submission(self, id, sign, request).await
    }

    pub async fn decline_submission(
        &self,
        id: i64,
        decline: DeclineSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        decide::decline_submission(self, id, decline, request).await
    }
}
