//! # Rust AMQP Logger
//!
//! A leveled logger that turns every log call into a JSON record published
//! on an AMQP broker.
//!
//! ## Topologies
//!
//! - **Exchange**: records are broadcast through a transient fanout
//!   exchange to whoever is subscribed at that moment, and dropped otherwise.
//! - **Queue**: records are persisted in a durable queue until a consumer
//!   takes them, tagged with the name of the emitting service.
//!
//! Each logger opens at most one connection, either while it is built or on
//! its first log call, and shares it across threads.

pub mod core;
pub mod macros;
pub mod topology;
pub mod transport;

pub mod prelude {
    pub use crate::core::{
        BrokerEndpoint, BrokerLogger, ExchangeLogger, FieldValue, LeveledLogger, LogContext,
        LogLevel, LogRecord, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, QueueLogger,
        Result,
    };
}

pub use crate::core::{
    BrokerEndpoint, BrokerLogger, ConnectionManager, ContextPayload, ExchangeLogger, FieldValue,
    LeveledLogger, LogContext, LogLevel, LogRecord, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, OpaqueValue, QueueLogger, RecordBuilder, Result, SourceTag, DEFAULT_PORT,
    FALLBACK_SOURCE,
};
pub use topology::{DurableQueue, FanoutExchange, Topology};
#[cfg(feature = "amqp")]
pub use transport::AmqpBroker;
pub use transport::{Broker, BrokerChannel, MemoryBroker};
