use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    publisher_confirm::Confirmation,
    types::FieldTable,
};
use tracing::{debug, info, warn};

use crate::{
    clients::{Delivery, MessageBroker},
    errors::WriterError,
    models::topology::{ExchangeSpec, QueueSpec},
};

const PERSISTENT: u8 = 2;
const CONTENT_TYPE: &str = "application/json";
const REPLY_SUCCESS: u16 = 200;

pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
}

impl RabbitMqClient {
    pub async fn connect(rabbitmq_url: &str) -> Result<Self, WriterError> {
        info!("Connecting to RabbitMQ");

        let connection = Connection::connect(rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|e| WriterError::Connection(format!("Failed to connect to RabbitMQ: {}", e)))?;

        debug!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| WriterError::Connection(format!("RabbitMQ channel creation failed: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| {
                WriterError::Connection(format!("Failed to enable publisher confirms: {}", e))
            })?;

        debug!("RabbitMQ channel created in confirm mode");

        Ok(Self {
            connection,
            channel,
        })
    }

    /// Closes the channel, then the connection. Errors are logged, not returned,
    /// so shutdown never masks the outcome of the run.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "OK".into()).await {
            warn!(error = %e, "Failed to close RabbitMQ channel");
        }

        if let Err(e) = self.connection.close(REPLY_SUCCESS, "OK".into()).await {
            warn!(error = %e, "Failed to close RabbitMQ connection");
        }

        debug!("RabbitMQ connection closed");
    }
}

#[async_trait]
impl MessageBroker for RabbitMqClient {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), WriterError> {
        self.channel
            .exchange_declare(
                exchange.name.as_str().into(),
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: exchange.durable,
                    auto_delete: exchange.auto_delete,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                WriterError::Topology(format!(
                    "Failed to declare exchange {}: {}",
                    exchange.name, e
                ))
            })?;

        debug!(exchange = %exchange.name, "Exchange declared");

        Ok(())
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), WriterError> {
        self.channel
            .queue_declare(
                queue.name.as_str().into(),
                QueueDeclareOptions {
                    durable: queue.durable,
                    auto_delete: queue.auto_delete,
                    exclusive: queue.exclusive,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                WriterError::Topology(format!("Failed to declare queue {}: {}", queue.name, e))
            })?;

        debug!(queue = %queue.name, "Queue declared");

        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), WriterError> {
        self.channel
            .queue_bind(
                queue.into(),
                exchange.into(),
                routing_key.into(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| WriterError::Topology(format!("Failed to bind queue {}: {}", queue, e)))?;

        debug!(queue, exchange, routing_key, "Queue bound");

        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        mandatory: bool,
    ) -> Result<Delivery, WriterError> {
        let confirm = self
            .channel
            .basic_publish(
                exchange.into(),
                routing_key.into(),
                BasicPublishOptions {
                    mandatory,
                    immediate: false,
                },
                payload,
                BasicProperties::default()
                    .with_delivery_mode(PERSISTENT)
                    .with_content_type(CONTENT_TYPE.into()),
            )
            .await
            .map_err(|e| WriterError::Publish(format!("Failed to publish message: {}", e)))?;

        let confirmation = confirm
            .await
            .map_err(|e| WriterError::Publish(format!("Failed to await publisher confirm: {}", e)))?;

        match confirmation {
            Confirmation::Ack(None) => Ok(Delivery::Confirmed),
            Confirmation::Ack(Some(_)) => Ok(Delivery::Returned),
            Confirmation::Nack(_) => Err(WriterError::Publish(
                "Broker rejected the message (nack)".to_string(),
            )),
            Confirmation::NotRequested => Err(WriterError::Publish(
                "Channel is not in publisher confirm mode".to_string(),
            )),
        }
    }
}
