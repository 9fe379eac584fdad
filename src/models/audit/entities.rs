use serde::{Deserialize, Serialize};

// 审计日志
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 新审计记录
#[derive(Debug, Clone, Default)]
pub struct NewAuditLog {
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}

impl NewAuditLog {
    pub fn new(action: &str, entity_type: &str, entity_id: Option<i64>) -> Self {
        Self {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            ..Default::default()
        }
    }

    pub fn school(mut self, school_id: Option<i64>) -> Self {
        self.school_id = school_id;
        self
    }

    pub fn actor(mut self, actor_id: i64) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}
