use serde::{Deserialize, Serialize};

use crate::define_string_enum;

define_string_enum! {
    /// 用户角色
    pub enum UserRole {
        Admin => "admin",       // 平台管理员
        Teacher => "teacher",   // 教师
        Reviewer => "reviewer", // 审核人
        Parent => "parent",     // 家长
    }
}

impl UserRole {
    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn teacher_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin]
    }
    pub fn staff_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Reviewer, &Self::Admin]
    }
    pub fn reviewer_roles() -> &'static [&'static UserRole] {
        &[&Self::Reviewer, &Self::Admin]
    }
    pub fn parent_roles() -> &'static [&'static UserRole] {
        &[&Self::Parent]
    }
}

define_string_enum! {
    /// 用户状态
    pub enum UserStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub school_id: Option<i64>,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// 用户是否可以访问指定学校的数据
    pub fn can_access_school(&self, school_id: i64) -> bool {
        self.is_admin() || self.school_id == Some(school_id)
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            self.role.as_str(),
            refresh_token_expiry,
        )
        .map_err(|e| format!("Failed to generate token pair: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().ok(), Some(*role));
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserializes_from_lowercase() {
        let role: UserRole = serde_json::from_str("\"reviewer\"").expect("valid role");
        assert_eq!(role, UserRole::Reviewer);
        assert!(serde_json::from_str::<UserRole>("\"Reviewer\"").is_err());
    }
}
