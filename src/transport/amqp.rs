//! AMQP 0-9-1 transport backed by `amiquip`
//!
//! Connects with a plain TCP stream; the connection and its single channel
//! live as long as the logger that opened them.

use super::{
    Broker, BrokerChannel, Delivery, ExchangeDeclaration, ExchangeKind, QueueDeclaration,
    PERSISTENT_DELIVERY_MODE,
};
use crate::core::{BrokerEndpoint, LoggerError, Result};
use amiquip::{
    AmqpProperties, Channel, Connection, ExchangeDeclareOptions, ExchangeType, Publish,
    QueueDeclareOptions,
};

/// Production broker: one `amiquip` connection per logger
///
/// # Example
///
/// ```no_run
/// use rust_amqp_logger::prelude::*;
///
/// let logger = QueueLogger::new("localhost", "guest", "guest", "logs", 5672, Some("billing"))?;
/// logger.error("payment gateway timeout", &LogContext::new().with_field("order", 42))?;
/// # Ok::<(), LoggerError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpBroker;

impl AmqpBroker {
    pub fn new() -> Self {
        Self
    }
}

impl Broker for AmqpBroker {
    fn connect(&self, endpoint: &BrokerEndpoint) -> Result<Box<dyn BrokerChannel>> {
        let mut connection = Connection::insecure_open(&endpoint.amqp_url())
            .map_err(|e| LoggerError::connection(endpoint.to_string(), e.to_string()))?;

        let channel = match connection.open_channel(None) {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = connection.close() {
                    tracing::debug!(error = %close_err, "closing connection after failed open");
                }
                return Err(LoggerError::connection(
                    endpoint.to_string(),
                    e.to_string(),
                ));
            }
        };

        Ok(Box::new(AmqpChannel {
            endpoint: endpoint.to_string(),
            connection: Some(connection),
            channel: Some(channel),
        }))
    }

    fn name(&self) -> &str {
        "amqp"
    }
}

struct AmqpChannel {
    endpoint: String,
    connection: Option<Connection>,
    channel: Option<Channel>,
}

impl AmqpChannel {
    fn channel(&self) -> Result<&Channel> {
        self.channel.as_ref().ok_or_else(|| {
            LoggerError::connection(self.endpoint.clone(), "channel already closed")
        })
    }
}

fn exchange_type(kind: ExchangeKind) -> ExchangeType {
    match kind {
        ExchangeKind::Fanout => ExchangeType::Fanout,
        ExchangeKind::Direct => ExchangeType::Direct,
        ExchangeKind::Topic => ExchangeType::Topic,
    }
}

impl BrokerChannel for AmqpChannel {
    fn declare_exchange(&mut self, declaration: &ExchangeDeclaration) -> Result<()> {
        let channel = self.channel()?;
        let result = if declaration.passive {
            channel
                .exchange_declare_passive(declaration.name.as_str())
                .map(|_| ())
        } else {
            let options = ExchangeDeclareOptions {
                durable: declaration.durable,
                auto_delete: declaration.auto_delete,
                internal: false,
                ..ExchangeDeclareOptions::default()
            };
            channel
                .exchange_declare(
                    exchange_type(declaration.kind),
                    declaration.name.as_str(),
                    options,
                )
                .map(|_| ())
        };

        result.map_err(|e| LoggerError::declare("exchange", &declaration.name, e.to_string()))
    }

    fn declare_queue(&mut self, declaration: &QueueDeclaration) -> Result<()> {
        let channel = self.channel()?;
        let result = if declaration.passive {
            channel
                .queue_declare_passive(declaration.name.as_str())
                .map(|_| ())
        } else {
            let options = QueueDeclareOptions {
                durable: declaration.durable,
                exclusive: declaration.exclusive,
                auto_delete: declaration.auto_delete,
                ..QueueDeclareOptions::default()
            };
            channel
                .queue_declare(declaration.name.as_str(), options)
                .map(|_| ())
        };

        result.map_err(|e| LoggerError::declare("queue", &declaration.name, e.to_string()))
    }

    fn publish(&mut self, delivery: &Delivery<'_>, body: &[u8]) -> Result<()> {
        let channel = self.channel()?;

        let content_type = delivery.content_type.to_string();
        let mut properties = AmqpProperties::default().with_content_type(content_type);
        if delivery.persistent {
            properties = properties.with_delivery_mode(PERSISTENT_DELIVERY_MODE);
        }

        channel
            .basic_publish(
                delivery.exchange,
                Publish::with_properties(body, delivery.routing_key, properties),
            )
            .map_err(|e| LoggerError::publish(delivery.destination(), e.to_string()))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        let channel_result = match self.channel.take() {
            Some(channel) => channel.close(),
            None => Ok(()),
        };
        let connection_result = match self.connection.take() {
            Some(connection) => connection.close(),
            None => Ok(()),
        };

        channel_result
            .and(connection_result)
            .map_err(|e| LoggerError::connection(self.endpoint.clone(), e.to_string()))
    }
}
