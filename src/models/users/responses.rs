use super::entities::User;
use crate::models::common::PaginatedResponse;

// 用户列表响应
pub type UserListResponse = PaginatedResponse<User>;
