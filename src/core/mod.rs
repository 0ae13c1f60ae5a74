//! Core logger types and traits

pub mod config;
pub mod connection;
pub mod error;
pub mod leveled;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;

pub use config::{BrokerEndpoint, LoggerConfig, DEFAULT_PORT, DEFAULT_VHOST};
pub use connection::ConnectionManager;
pub use error::{LoggerError, Result};
pub use leveled::LeveledLogger;
pub use log_context::{FieldValue, LogContext, OpaqueValue};
pub use log_level::LogLevel;
pub use log_record::{ContextPayload, LogRecord, RecordBuilder, SourceTag, FALLBACK_SOURCE};
pub use logger::{BrokerLogger, ExchangeLogger, LoggerBuilder, QueueLogger};
pub use metrics::LoggerMetrics;
