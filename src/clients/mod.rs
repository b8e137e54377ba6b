use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::WriterError,
    models::{
        audit::AuditRecord,
        topology::{ExchangeSpec, QueueSpec},
    },
};

pub mod database;
pub mod rbmq;

/// How the broker disposed of a confirmed publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Acked by the broker. Without `mandatory` this says nothing about routing.
    Confirmed,
    /// Returned by the broker because no queue matched a mandatory publish.
    Returned,
}

/// Broker operations the writer needs. Declarations must be idempotent and
/// fail when an entity already exists with different properties.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), WriterError>;

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), WriterError>;

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), WriterError>;

    /// Persistent JSON publish; resolves once the broker confirms it.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        mandatory: bool,
    ) -> Result<Delivery, WriterError>;
}

/// Write-only durable store for audit records. A write is all-or-nothing.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, record: &AuditRecord) -> Result<(), WriterError>;
}

#[async_trait]
impl<T: AuditStore + ?Sized> AuditStore for Arc<T> {
    async fn insert(&self, record: &AuditRecord) -> Result<(), WriterError> {
        (**self).insert(record).await
    }
}
