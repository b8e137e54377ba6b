use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use notify_writer::{
    clients::{AuditStore, Delivery, MessageBroker},
    errors::WriterError,
    models::{
        audit::AuditRecord,
        topology::{ExchangeSpec, QueueSpec, topic_matches},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    DeclareExchange,
    DeclareQueue,
    Bind,
    Publish,
}

#[derive(Default)]
struct BrokerState {
    exchanges: BTreeMap<String, ExchangeSpec>,
    queues: BTreeMap<String, (QueueSpec, Vec<Vec<u8>>)>,
    bindings: BTreeSet<(String, String, String)>,
    publishes: usize,
}

/// Broker that mimics RabbitMQ declare and topic routing semantics in memory.
#[derive(Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    fail_at: Option<FailAt>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(fail_at: FailAt) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..Self::default()
        }
    }

    /// Pre-existing exchange, as left behind by another deployment.
    pub fn with_exchange(self, exchange: ExchangeSpec) -> Self {
        self.state
            .lock()
            .unwrap()
            .exchanges
            .insert(exchange.name.clone(), exchange);
        self
    }

    pub fn with_queue(self, queue: QueueSpec) -> Self {
        self.state
            .lock()
            .unwrap()
            .queues
            .insert(queue.name.clone(), (queue, Vec::new()));
        self
    }

    pub fn exchanges(&self) -> Vec<ExchangeSpec> {
        self.state.lock().unwrap().exchanges.values().cloned().collect()
    }

    pub fn queue_names(&self) -> Vec<String> {
        self.state.lock().unwrap().queues.keys().cloned().collect()
    }

    pub fn bindings(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().bindings.iter().cloned().collect()
    }

    pub fn messages(&self, queue: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .queues
            .get(queue)
            .map(|(_, messages)| messages.clone())
            .unwrap_or_default()
    }

    pub fn publish_count(&self) -> usize {
        self.state.lock().unwrap().publishes
    }

    fn check(&self, step: FailAt) -> Result<(), WriterError> {
        if self.fail_at == Some(step) {
            let err = format!("injected failure at {:?}", step);
            return Err(match step {
                FailAt::Publish => WriterError::Publish(err),
                _ => WriterError::Topology(err),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), WriterError> {
        self.check(FailAt::DeclareExchange)?;
        let mut state = self.state.lock().unwrap();

        match state.exchanges.get(&exchange.name) {
            Some(existing) if existing != exchange => Err(WriterError::Topology(format!(
                "PRECONDITION_FAILED - inequivalent arg for exchange '{}'",
                exchange.name
            ))),
            Some(_) => Ok(()),
            None => {
                state
                    .exchanges
                    .insert(exchange.name.clone(), exchange.clone());
                Ok(())
            }
        }
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), WriterError> {
        self.check(FailAt::DeclareQueue)?;
        let mut state = self.state.lock().unwrap();

        match state.queues.get(&queue.name) {
            Some((existing, _)) if existing != queue => Err(WriterError::Topology(format!(
                "PRECONDITION_FAILED - inequivalent arg for queue '{}'",
                queue.name
            ))),
            Some(_) => Ok(()),
            None => {
                state
                    .queues
                    .insert(queue.name.clone(), (queue.clone(), Vec::new()));
                Ok(())
            }
        }
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), WriterError> {
        self.check(FailAt::Bind)?;
        let mut state = self.state.lock().unwrap();

        if !state.queues.contains_key(queue) || !state.exchanges.contains_key(exchange) {
            return Err(WriterError::Topology(format!(
                "NOT_FOUND - cannot bind {} to {}",
                queue, exchange
            )));
        }

        state.bindings.insert((
            queue.to_string(),
            exchange.to_string(),
            routing_key.to_string(),
        ));
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        mandatory: bool,
    ) -> Result<Delivery, WriterError> {
        self.check(FailAt::Publish)?;
        let mut state = self.state.lock().unwrap();

        if !state.exchanges.contains_key(exchange) {
            return Err(WriterError::Publish(format!(
                "NOT_FOUND - no exchange '{}'",
                exchange
            )));
        }
        state.publishes += 1;

        let targets: BTreeSet<String> = state
            .bindings
            .iter()
            .filter(|(_, bound_exchange, pattern)| {
                bound_exchange == exchange && topic_matches(pattern, routing_key)
            })
            .map(|(queue, _, _)| queue.clone())
            .collect();

        if targets.is_empty() {
            return Ok(if mandatory {
                Delivery::Returned
            } else {
                Delivery::Confirmed
            });
        }

        for queue in targets {
            if let Some((_, messages)) = state.queues.get_mut(&queue) {
                messages.push(payload.to_vec());
            }
        }

        Ok(Delivery::Confirmed)
    }
}

/// Audit store keeping committed records in memory. A configured delay is
/// spent before the commit, so an abandoned write leaves nothing behind.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
    delay: Option<Duration>,
    fail: bool,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<(), WriterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(WriterError::Audit("Database write failed: disk full".to_string()));
        }

        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
