use serde::{Deserialize, Serialize};

// 表单附件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDocument {
    pub id: i64,
    pub form_id: i64,
    pub uploaded_by: i64,
    pub original_name: String,
    #[serde(skip_serializing)]
    pub stored_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub download_token: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 写入存储层的附件信息
#[derive(Debug, Clone)]
pub struct NewFormDocument {
    pub form_id: i64,
    pub uploaded_by: i64,
    pub original_name: String,
    pub stored_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub download_token: String,
}
