//! Broker transports
//!
//! A [`Broker`] opens one [`BrokerChannel`] per logger. The channel is the
//! only thing the topologies talk to: declare the destination, publish
//! serialized records, close.

#[cfg(feature = "amqp")]
pub mod amqp;
pub mod memory;

#[cfg(feature = "amqp")]
pub use amqp::AmqpBroker;
pub use memory::{MemoryBroker, StoredMessage};

use crate::core::{BrokerEndpoint, Result};

/// Content type stamped on every published record
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// AMQP delivery mode for messages written to stable storage
pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Fanout,
    Direct,
    Topic,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Direct => "direct",
            ExchangeKind::Topic => "topic",
        }
    }
}

/// Parameters of an `exchange.declare`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeDeclaration {
    pub name: String,
    pub kind: ExchangeKind,
    pub passive: bool,
    pub durable: bool,
    pub auto_delete: bool,
}

impl ExchangeDeclaration {
    /// Transient fanout exchange, created if absent
    pub fn fanout(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Fanout,
            passive: false,
            durable: false,
            auto_delete: false,
        }
    }
}

/// Parameters of a `queue.declare`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDeclaration {
    pub name: String,
    pub passive: bool,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
}

impl QueueDeclaration {
    /// Durable, shared queue, created if absent
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passive: false,
            durable: true,
            exclusive: false,
            auto_delete: false,
        }
    }
}

/// Where and how a single message is published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery<'a> {
    /// Exchange name; empty for the default exchange
    pub exchange: &'a str,
    pub routing_key: &'a str,
    pub persistent: bool,
    pub content_type: &'a str,
}

impl Delivery<'_> {
    /// Name used in error messages
    pub fn destination(&self) -> &str {
        if self.exchange.is_empty() {
            self.routing_key
        } else {
            self.exchange
        }
    }
}

/// An open channel on a broker connection
pub trait BrokerChannel: Send {
    fn declare_exchange(&mut self, declaration: &ExchangeDeclaration) -> Result<()>;
    fn declare_queue(&mut self, declaration: &QueueDeclaration) -> Result<()>;
    fn publish(&mut self, delivery: &Delivery<'_>, body: &[u8]) -> Result<()>;
    /// Close the channel and the connection behind it
    fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for broker channels
pub trait Broker: Send + Sync {
    /// Open a connection and a channel on it
    fn connect(&self, endpoint: &BrokerEndpoint) -> Result<Box<dyn BrokerChannel>>;
    fn name(&self) -> &str;
}
