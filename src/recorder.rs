use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::{
    clients::AuditStore,
    errors::WriterError,
    models::{audit::AuditRecord, status::AuditStatus},
};

/// Final stage of the pipeline. Runs only after a confirmed publish.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record(
        &self,
        payload: &[u8],
        routing_key: &str,
        status: AuditStatus,
    ) -> Result<(), WriterError>;

    /// Whether this recorder persists anything.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Writes one audit record per publish within a fixed time budget.
pub struct AuditRecorder<S> {
    store: S,
    budget: Duration,
}

impl<S: AuditStore> AuditRecorder<S> {
    pub fn new(store: S, budget: Duration) -> Self {
        Self { store, budget }
    }
}

#[async_trait]
impl<S: AuditStore> Recorder for AuditRecorder<S> {
    async fn record(
        &self,
        payload: &[u8],
        routing_key: &str,
        status: AuditStatus,
    ) -> Result<(), WriterError> {
        let message = String::from_utf8(payload.to_vec())
            .map_err(|e| WriterError::Audit(format!("Payload is not valid UTF-8: {}", e)))?;

        let record = AuditRecord::new(message, routing_key.to_string(), status);

        match timeout(self.budget, self.store.insert(&record)).await {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    budget_ms = self.budget.as_millis() as u64,
                    routing_key,
                    "Audit write abandoned after exceeding its time budget"
                );
                return Err(WriterError::AuditTimeout(self.budget));
            }
        }

        info!(routing_key, status = %status, "Audit record written");

        Ok(())
    }
}

/// Stands in for the audit stage when auditing is disabled.
pub struct NoopRecorder;

#[async_trait]
impl Recorder for NoopRecorder {
    async fn record(
        &self,
        _payload: &[u8],
        routing_key: &str,
        _status: AuditStatus,
    ) -> Result<(), WriterError> {
        debug!(routing_key, "Auditing disabled, skipping record");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
