use std::io::Write;

use tracing::{debug, info, warn};

use crate::{
    clients::{Delivery, MessageBroker},
    errors::WriterError,
    models::{message::Envelope, status::AuditStatus, topology::Topology},
    recorder::Recorder,
};

/// Declares the exchange, then each queue followed by its binding.
/// Safe to run on every invocation; the first failing step aborts.
pub async fn initialize_topology<B: MessageBroker + ?Sized>(
    broker: &B,
    topology: &Topology,
) -> Result<(), WriterError> {
    broker.declare_exchange(&topology.exchange).await?;

    for (routing_key, queue) in topology.bindings() {
        broker.declare_queue(queue).await?;
        broker
            .bind_queue(&queue.name, &topology.exchange.name, routing_key)
            .await?;
    }

    info!(
        exchange = %topology.exchange.name,
        bindings = topology.bindings().count(),
        "Topology initialized"
    );

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// Unroutable messages are accepted and dropped by the broker.
    #[default]
    Lenient,
    /// Unroutable messages fail the publish.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub routing_key: String,
    pub delivery: Delivery,
    /// Whether a binding in the declared topology matches the key.
    pub matches_binding: bool,
}

impl PublishReceipt {
    pub fn audit_status(&self) -> AuditStatus {
        AuditStatus::from_routing(self.matches_binding)
    }
}

/// Publishes a serialized envelope and waits for the broker's confirm.
pub async fn publish<B: MessageBroker + ?Sized>(
    broker: &B,
    topology: &Topology,
    routing_key: &str,
    payload: &[u8],
    mode: RoutingMode,
) -> Result<PublishReceipt, WriterError> {
    let matches_binding = topology.routes(routing_key);

    if !matches_binding {
        if mode == RoutingMode::Strict {
            return Err(WriterError::UnroutableKey(routing_key.to_string()));
        }

        warn!(
            routing_key,
            exchange = %topology.exchange.name,
            "No declared binding matches routing key; the broker will drop the message"
        );
    }

    let delivery = broker
        .publish(
            &topology.exchange.name,
            routing_key,
            payload,
            mode == RoutingMode::Strict,
        )
        .await?;

    if delivery == Delivery::Returned {
        return Err(WriterError::UnroutableKey(routing_key.to_string()));
    }

    debug!(routing_key, "Publish confirmed by broker");

    Ok(PublishReceipt {
        routing_key: routing_key.to_string(),
        delivery,
        matches_binding,
    })
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub routing_key: String,
    pub message_body: String,
    pub system: String,
    pub employee_id: i64,
}

/// Runs topology, publish and audit in order for a single message. The
/// routing key is echoed to `out` once the topology is in place.
pub async fn run_pipeline<B, R, W>(
    broker: &B,
    recorder: &R,
    topology: &Topology,
    request: &PublishRequest,
    mode: RoutingMode,
    out: &mut W,
) -> Result<PublishReceipt, WriterError>
where
    B: MessageBroker + ?Sized,
    R: Recorder + ?Sized,
    W: Write + ?Sized,
{
    initialize_topology(broker, topology).await?;

    if let Err(e) = writeln!(out, "{}", request.routing_key) {
        warn!(error = %e, "Failed to echo routing key");
    }

    let envelope = Envelope::build(
        request.system.as_str(),
        request.employee_id,
        request.message_body.as_str(),
    );
    let payload = envelope.to_bytes()?;

    let receipt = publish(broker, topology, &request.routing_key, &payload, mode).await?;

    info!(
        routing_key = %request.routing_key,
        payload = %String::from_utf8_lossy(&payload),
        " [x] Sent"
    );

    recorder
        .record(&payload, &receipt.routing_key, receipt.audit_status())
        .await?;

    Ok(receipt)
}
