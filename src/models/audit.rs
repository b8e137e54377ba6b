use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::status::AuditStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: AuditStatus,
    pub router_key: String,
}

impl AuditRecord {
    pub fn new(message: String, router_key: String, status: AuditStatus) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
            status,
            router_key,
        }
    }
}
