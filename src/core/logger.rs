//! Broker-backed logger

use super::{
    config::{BrokerEndpoint, LoggerConfig},
    connection::ConnectionManager,
    error::{LoggerError, Result},
    leveled::LeveledLogger,
    log_context::LogContext,
    log_level::LogLevel,
    log_record::RecordBuilder,
    metrics::LoggerMetrics,
};
use crate::topology::{DurableQueue, FanoutExchange, Topology};
use crate::transport::Broker;
use std::sync::Arc;
use std::time::Duration;

/// Logger that publishes every call as one record on a broker
///
/// The topology decides where records go; see [`ExchangeLogger`] and
/// [`QueueLogger`].
pub struct BrokerLogger<T: Topology> {
    topology: T,
    connection: ConnectionManager,
    metrics: Arc<LoggerMetrics>,
}

/// Broadcasts transient records to a fanout exchange
pub type ExchangeLogger = BrokerLogger<FanoutExchange>;

/// Stores persistent, source-tagged records in a durable queue
pub type QueueLogger = BrokerLogger<DurableQueue>;

impl<T: Topology> BrokerLogger<T> {
    /// Create a logger over any broker and topology
    ///
    /// With `connect_immediately` the connection and declaration happen here
    /// and their errors are returned; otherwise the first log call does it.
    pub fn with_broker(
        broker: Arc<dyn Broker>,
        endpoint: BrokerEndpoint,
        topology: T,
        connect_immediately: bool,
    ) -> Result<Self> {
        endpoint.validate()?;
        if topology.destination().is_empty() {
            return Err(LoggerError::config(
                "Topology",
                "destination name must not be empty",
            ));
        }

        let metrics = Arc::new(LoggerMetrics::new());
        let logger = Self {
            connection: ConnectionManager::new(broker, endpoint, Arc::clone(&metrics)),
            topology,
            metrics,
        };

        if connect_immediately {
            logger.connection.ensure_ready(&logger.topology)?;
        }

        Ok(logger)
    }

    fn publish(
        &self,
        level: LogLevel,
        message: &str,
        context: &LogContext,
        source: Option<&str>,
    ) -> Result<()> {
        let result = self.connection.with_channel(&self.topology, |channel| {
            let builder = RecordBuilder::new(level, message)
                .context(context)
                .source(self.topology.source_for(source));
            if builder.context_fell_back() {
                self.metrics.record_context_fallback();
            }

            let record = builder.build();
            self.topology.publish(channel, &record)
        });

        match &result {
            Ok(()) => {
                self.metrics.record_published();
            }
            Err(_) => {
                self.metrics.record_publish_failure();
            }
        }
        result
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn destination(&self) -> &str {
        self.topology.destination()
    }

    pub fn endpoint(&self) -> &BrokerEndpoint {
        self.connection.endpoint()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Get the logger metrics
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Close the broker connection
    ///
    /// Idempotent. Log calls made afterwards fail with
    /// [`LoggerError::LoggerClosed`].
    pub fn close(&self) -> Result<()> {
        self.connection.close()
    }
}

impl<T: Topology> LeveledLogger for BrokerLogger<T> {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()> {
        self.publish(level, message, context, None)
    }
}

impl<T: Topology> Drop for BrokerLogger<T> {
    fn drop(&mut self) {
        if let Err(e) = self.connection.close() {
            tracing::warn!(
                destination = self.topology.destination(),
                error = %e,
                "failed to close broker connection"
            );
        }
    }
}

impl<T: Topology> std::fmt::Debug for BrokerLogger<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerLogger")
            .field("topology", &self.topology)
            .field("endpoint", self.connection.endpoint())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(feature = "amqp")]
impl ExchangeLogger {
    /// Connect to an AMQP broker and declare a fanout exchange
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        exchange: impl Into<String>,
        port: u16,
    ) -> Result<Self> {
        LoggerBuilder::new()
            .host(host)
            .port(port)
            .credentials(username, password)
            .exchange(exchange)
    }
}

impl QueueLogger {
    /// Connect to an AMQP broker and declare a durable queue
    #[cfg(feature = "amqp")]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        queue: impl Into<String>,
        port: u16,
        source: Option<&str>,
    ) -> Result<Self> {
        let mut builder = LoggerBuilder::new()
            .host(host)
            .port(port)
            .credentials(username, password);
        if let Some(source) = source {
            builder = builder.source(source);
        }
        builder.queue(queue)
    }

    /// Log with a source tag for this call only
    pub fn log_from(
        &self,
        source: &str,
        level: LogLevel,
        message: &str,
        context: &LogContext,
    ) -> Result<()> {
        self.publish(level, message, context, Some(source))
    }
}

/// Builder for broker loggers
///
/// # Example
/// ```
/// use rust_amqp_logger::prelude::*;
/// use rust_amqp_logger::transport::MemoryBroker;
/// use std::sync::Arc;
///
/// let broker = MemoryBroker::new();
/// let logger = LoggerBuilder::new()
///     .broker(Arc::new(broker.clone()))
///     .host("rabbit.internal")
///     .credentials("app", "secret")
///     .connect_immediately(false)
///     .exchange("events")?;
///
/// assert!(!logger.is_connected());
/// logger.debug("ping", &LogContext::new())?;
/// assert!(logger.is_connected());
/// # Ok::<(), LoggerError>(())
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    broker: Option<Arc<dyn Broker>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            broker: None,
        }
    }

    /// Start from a full configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn endpoint(mut self, endpoint: BrokerEndpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.endpoint.host = host.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn port(mut self, port: u16) -> Self {
        self.config.endpoint.port = port;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.endpoint.username = username.into();
        self.config.endpoint.password = password.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn virtual_host(mut self, vhost: impl Into<String>) -> Self {
        self.config.endpoint.virtual_host = vhost.into();
        self
    }

    /// Bound the time spent establishing the connection
    #[must_use = "builder methods return a new value"]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.endpoint.connect_timeout_ms =
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Connect while building (default) or on the first log call
    #[must_use = "builder methods return a new value"]
    pub fn connect_immediately(mut self, enable: bool) -> Self {
        self.config.connect_immediately = enable;
        self
    }

    /// Source tag for queue loggers
    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = Some(source.into());
        self
    }

    /// Source tag used when [`source`](Self::source) is not set
    #[must_use = "builder methods return a new value"]
    pub fn default_source(mut self, source: impl Into<String>) -> Self {
        self.config.default_source = Some(source.into());
        self
    }

    /// Use a specific broker transport instead of AMQP
    #[must_use = "builder methods return a new value"]
    pub fn broker(mut self, broker: Arc<dyn Broker>) -> Self {
        self.broker = Some(broker);
        self
    }

    fn take_broker(&mut self) -> Result<Arc<dyn Broker>> {
        match self.broker.take() {
            Some(broker) => Ok(broker),
            None => default_broker(),
        }
    }

    /// Build a durable-queue logger over the configured destination
    pub fn build_queue(self) -> Result<QueueLogger> {
        let name = self.config.destination.clone();
        self.queue(name)
    }

    /// Build a fanout-exchange logger over the configured destination
    pub fn build_exchange(self) -> Result<ExchangeLogger> {
        let name = self.config.destination.clone();
        self.exchange(name)
    }

    /// Build a fanout-exchange logger
    pub fn exchange(mut self, name: impl Into<String>) -> Result<ExchangeLogger> {
        let broker = self.take_broker()?;
        BrokerLogger::with_broker(
            broker,
            self.config.endpoint,
            FanoutExchange::new(name),
            self.config.connect_immediately,
        )
    }

    /// Build a durable-queue logger
    pub fn queue(mut self, name: impl Into<String>) -> Result<QueueLogger> {
        let broker = self.take_broker()?;
        let topology = DurableQueue::new(name)
            .with_source(self.config.source)
            .with_default_source(self.config.default_source);
        BrokerLogger::with_broker(
            broker,
            self.config.endpoint,
            topology,
            self.config.connect_immediately,
        )
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "amqp")]
fn default_broker() -> Result<Arc<dyn Broker>> {
    Ok(Arc::new(crate::transport::AmqpBroker::new()))
}

#[cfg(not(feature = "amqp"))]
fn default_broker() -> Result<Arc<dyn Broker>> {
    Err(LoggerError::config(
        "LoggerBuilder",
        "no broker given and the amqp feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryBroker;

    fn builder(broker: &MemoryBroker) -> LoggerBuilder {
        LoggerBuilder::new().broker(Arc::new(broker.clone()))
    }

    #[test]
    fn test_eager_connects_during_build() {
        let broker = MemoryBroker::new();
        let logger = builder(&broker).exchange("events").unwrap();

        assert!(logger.is_connected());
        assert_eq!(broker.connect_attempts(), 1);
        assert!(broker.exchange_exists("events"));
    }

    #[test]
    fn test_lazy_waits_for_first_call() {
        let broker = MemoryBroker::new();
        let logger = builder(&broker)
            .connect_immediately(false)
            .queue("logs")
            .unwrap();

        assert_eq!(broker.connect_attempts(), 0);
        assert!(!broker.queue_exists("logs"));

        logger.info("first", &LogContext::new()).unwrap();
        logger.info("second", &LogContext::new()).unwrap();

        assert_eq!(broker.connect_attempts(), 1);
        assert_eq!(broker.queue_len("logs"), 2);
        assert_eq!(logger.metrics().published(), 2);
    }

    #[test]
    fn test_empty_names_rejected() {
        let broker = MemoryBroker::new();
        assert!(matches!(
            builder(&broker).queue(""),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            builder(&broker).host("").exchange("events"),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        assert_eq!(broker.connect_attempts(), 0);
    }

    #[test]
    fn test_build_queue_uses_configured_destination() {
        let broker = MemoryBroker::new();
        let config = LoggerConfig {
            destination: "audit".to_string(),
            source: Some("billing".to_string()),
            ..LoggerConfig::default()
        };
        let logger = builder(&broker).config(config).build_queue().unwrap();

        assert_eq!(logger.destination(), "audit");
        assert_eq!(logger.topology().source().name(), "billing");
    }

    #[test]
    fn test_build_exchange_uses_configured_destination() {
        let broker = MemoryBroker::new();
        let config = LoggerConfig {
            destination: "events".to_string(),
            ..LoggerConfig::default()
        };
        let logger = builder(&broker).config(config).build_exchange().unwrap();

        assert_eq!(logger.destination(), "events");
        assert!(broker.exchange_exists("events"));

        let unnamed = builder(&broker).build_exchange();
        assert!(matches!(unnamed, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_publish_failure_counted_and_returned() {
        let broker = MemoryBroker::new();
        let logger = builder(&broker).queue("logs").unwrap();
        broker.set_fail_publish(true);

        let err = logger.error("lost", &LogContext::new()).unwrap_err();
        assert!(matches!(err, LoggerError::Publish { .. }));
        assert_eq!(logger.metrics().publish_failures(), 1);
        assert_eq!(logger.metrics().published(), 0);
    }

    #[test]
    fn test_drop_closes_channel() {
        let broker = MemoryBroker::new();
        {
            let logger = builder(&broker).queue("logs").unwrap();
            logger.info("bye", &LogContext::new()).unwrap();
            assert_eq!(broker.open_channels(), 1);
        }
        assert_eq!(broker.open_channels(), 0);
        assert_eq!(broker.queue_len("logs"), 1);
    }
}
