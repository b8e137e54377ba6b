use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Broker confirmed the message and a declared binding matches its key.
    Published,
    /// Broker confirmed the message but no declared binding matches its key,
    /// so the broker most likely dropped it.
    PublishedUnrouted,
}

impl AuditStatus {
    pub fn from_routing(matches_binding: bool) -> Self {
        if matches_binding {
            AuditStatus::Published
        } else {
            AuditStatus::PublishedUnrouted
        }
    }
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            AuditStatus::Published => write!(f, "published"),
            AuditStatus::PublishedUnrouted => write!(f, "published_unrouted"),
        }
    }
}
