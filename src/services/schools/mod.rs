pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::schools::requests::{CreateSchoolRequest, SchoolListParams, UpdateSchoolRequest};
use crate::services::app_state;
use crate::services::reminders::schedule::ReminderSchedule;
use crate::storage::Storage;
use crate::utils::validate::{validate_required_text, validate_slug};

pub struct SchoolService {
    storage: Option<Arc<dyn Storage>>,
}

impl SchoolService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => app_state::<dyn Storage>(request),
        }
    }

    pub async fn list_schools(
        &self,
        params: SchoolListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_schools(self, params, request).await
    }

    pub async fn create_school(
        &self,
        school: CreateSchoolRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_school(self, school, request).await
    }

    pub async fn get_school(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_school(self, id, request).await
    }

    pub async fn update_school(
        &self,
        id: i64,
        update: UpdateSchoolRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_school(self, id, update, request).await
    }

    pub async fn delete_school(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_school(self, id, request).await
    }
}

/// 校验并规范化学校字段，返回错误消息
fn normalize_school_fields(
    name: Option<&mut String>,
    slug: Option<&mut String>,
    schedule: Option<&mut Vec<String>>,
) -> Result<(), String> {
    if let Some(name) = name {
        validate_required_text(name, "School name", 200)?;
        *name = name.trim().to_string();
    }
    if let Some(slug) = slug {
        *slug = slug.trim().to_lowercase();
        validate_slug(slug)?;
    }
    if let Some(schedule) = schedule {
        *schedule = ReminderSchedule::parse(schedule.as_slice())?.to_strings();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_school_fields() {
        let mut name = "  Maple Elementary ".to_string();
        let mut slug = "Maple-Elem".to_string();
        let mut schedule = vec!["1d".to_string(), "3d".to_string()];
        normalize_school_fields(Some(&mut name), Some(&mut slug), Some(&mut schedule))
            .expect("valid fields");
        assert_eq!(name, "Maple Elementary");
        assert_eq!(slug, "maple-elem");
        assert_eq!(schedule, vec!["3d", "1d"]);
    }

    #[test]
    fn test_invalid_slug_is_rejected() {
        let mut slug = "maple elem".to_string();
        assert!(normalize_school_fields(None, Some(&mut slug), None).is_err());
    }
}
