use super::entities::School;
use crate::models::common::PaginatedResponse;

pub type SchoolListResponse = PaginatedResponse<School>;
