use serde::{Deserialize, Serialize};

// 学生实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub school_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub grade: String,
    pub group_name: Option<String>,
    pub external_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// 家长与学生的关联
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent_id: i64,
    pub student_id: i64,
    pub relationship: Option<String>,
}

// 学生关联的家长信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentParent {
    pub parent_id: i64,
    pub email: String,
    pub display_name: String,
    pub relationship: Option<String>,
}
