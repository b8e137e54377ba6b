use serde::{Deserialize, Serialize};

use crate::errors::WriterError;

/// Unit of work published to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub system: String,
    pub employee_id: i64,
    pub message_body: String,
}

impl Envelope {
    pub fn build(
        system: impl Into<String>,
        employee_id: i64,
        message_body: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            employee_id,
            message_body: message_body.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WriterError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(payload: &[u8]) -> Result<Self, WriterError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
