//! In-process broker
//!
//! Models the parts of an AMQP broker the logger depends on: exchanges and
//! queues with idempotent declaration, fanout and default-exchange routing,
//! the persistent delivery flag and what survives a restart. Used by the
//! test suites and by applications that want to assert on what they log
//! without running a server.

use super::{Broker, BrokerChannel, Delivery, ExchangeDeclaration, QueueDeclaration};
use crate::core::{BrokerEndpoint, LogRecord, LoggerError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A message sitting in an in-memory queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub persistent: bool,
    pub content_type: String,
}

impl StoredMessage {
    /// Decode the body back into a log record
    pub fn record(&self) -> Result<LogRecord> {
        LogRecord::from_json_bytes(&self.body)
    }
}

#[derive(Debug)]
struct MemoryQueue {
    declaration: QueueDeclaration,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
struct MemoryState {
    credentials: Option<(String, String)>,
    unreachable: bool,
    fail_publish: bool,
    /// Bumped by `restart`; channels from an older generation are dead
    generation: u64,
    connect_attempts: u64,
    open_channels: usize,
    exchanges: HashMap<String, ExchangeDeclaration>,
    queues: HashMap<String, MemoryQueue>,
    /// exchange name -> bound queue names
    bindings: HashMap<String, Vec<String>>,
    next_subscriber: u64,
    dropped: u64,
}

/// Cloneable handle to a shared in-memory broker
///
/// # Example
///
/// ```
/// use rust_amqp_logger::prelude::*;
/// use rust_amqp_logger::transport::MemoryBroker;
/// use std::sync::Arc;
///
/// let broker = MemoryBroker::new();
/// let logger = LoggerBuilder::new()
///     .broker(Arc::new(broker.clone()))
///     .source("billing")
///     .queue("logs")?;
///
/// logger.info("invoice sent", &LogContext::new())?;
///
/// let record = broker.messages("logs")[0].record()?;
/// assert_eq!(record.message, "billing: invoice sent");
/// # Ok::<(), LoggerError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept connections with these credentials
    #[must_use]
    pub fn with_credentials(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.state.lock().credentials = Some((username.into(), password.into()));
        self
    }

    /// Refuse every connection attempt while `true`
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Fail every publish while `true`
    pub fn set_fail_publish(&self, fail: bool) {
        self.state.lock().fail_publish = fail;
    }

    /// Declare an entity out of band, as another client would
    pub fn declare_queue(&self, declaration: QueueDeclaration) -> Result<()> {
        declare_queue_locked(&mut self.state.lock(), &declaration)
    }

    pub fn declare_exchange(&self, declaration: ExchangeDeclaration) -> Result<()> {
        declare_exchange_locked(&mut self.state.lock(), &declaration)
    }

    /// Bind a fresh transient queue to `exchange` and return its name
    pub fn subscribe(&self, exchange: &str) -> Result<String> {
        let mut state = self.state.lock();
        if !state.exchanges.contains_key(exchange) {
            return Err(LoggerError::other(format!(
                "NOT_FOUND - no exchange '{}'",
                exchange
            )));
        }

        state.next_subscriber += 1;
        let name = format!("amq.gen-{}", state.next_subscriber);
        let declaration = QueueDeclaration {
            name: name.clone(),
            passive: false,
            durable: false,
            exclusive: true,
            auto_delete: true,
        };
        state.queues.insert(
            name.clone(),
            MemoryQueue {
                declaration,
                messages: Vec::new(),
            },
        );
        state
            .bindings
            .entry(exchange.to_string())
            .or_default()
            .push(name.clone());

        Ok(name)
    }

    /// Simulate a broker restart
    ///
    /// Non-durable exchanges and queues disappear, durable queues keep their
    /// persistent messages only, and channels opened before the restart fail.
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.open_channels = 0;
        state.exchanges.retain(|_, decl| decl.durable);
        state.queues.retain(|_, queue| queue.declaration.durable);
        for queue in state.queues.values_mut() {
            queue.messages.retain(|m| m.persistent);
        }

        let MemoryState {
            bindings,
            exchanges,
            queues,
            ..
        } = &mut *state;
        bindings.retain(|exchange, _| exchanges.contains_key(exchange));
        for bound in bindings.values_mut() {
            bound.retain(|queue| queues.contains_key(queue));
        }
    }

    pub fn connect_attempts(&self) -> u64 {
        self.state.lock().connect_attempts
    }

    pub fn open_channels(&self) -> usize {
        self.state.lock().open_channels
    }

    /// Messages routed nowhere
    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }

    pub fn exchange_exists(&self, name: &str) -> bool {
        self.state.lock().exchanges.contains_key(name)
    }

    pub fn queue_exists(&self, name: &str) -> bool {
        self.state.lock().queues.contains_key(name)
    }

    pub fn exchange_declaration(&self, name: &str) -> Option<ExchangeDeclaration> {
        self.state.lock().exchanges.get(name).cloned()
    }

    pub fn queue_declaration(&self, name: &str) -> Option<QueueDeclaration> {
        self.state
            .lock()
            .queues
            .get(name)
            .map(|q| q.declaration.clone())
    }

    /// Copy of the messages waiting in `queue`
    pub fn messages(&self, queue: &str) -> Vec<StoredMessage> {
        self.state
            .lock()
            .queues
            .get(queue)
            .map(|q| q.messages.clone())
            .unwrap_or_default()
    }

    pub fn queue_len(&self, queue: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue)
            .map_or(0, |q| q.messages.len())
    }

    /// Remove and return the messages waiting in `queue`
    pub fn drain(&self, queue: &str) -> Vec<StoredMessage> {
        self.state
            .lock()
            .queues
            .get_mut(queue)
            .map(|q| std::mem::take(&mut q.messages))
            .unwrap_or_default()
    }

    /// Total number of messages held across all queues
    pub fn retained_count(&self) -> usize {
        self.state
            .lock()
            .queues
            .values()
            .map(|q| q.messages.len())
            .sum()
    }
}

fn declare_exchange_locked(
    state: &mut MemoryState,
    declaration: &ExchangeDeclaration,
) -> Result<()> {
    match state.exchanges.get(&declaration.name) {
        Some(existing) => {
            if declaration.passive {
                return Ok(());
            }
            if existing.kind != declaration.kind
                || existing.durable != declaration.durable
                || existing.auto_delete != declaration.auto_delete
            {
                return Err(LoggerError::declare(
                    "exchange",
                    declaration.name.clone(),
                    "PRECONDITION_FAILED - inequivalent arguments for existing exchange",
                ));
            }
            Ok(())
        }
        None if declaration.passive => Err(LoggerError::declare(
            "exchange",
            declaration.name.clone(),
            "NOT_FOUND - no exchange with this name",
        )),
        None => {
            state
                .exchanges
                .insert(declaration.name.clone(), declaration.clone());
            Ok(())
        }
    }
}

fn declare_queue_locked(state: &mut MemoryState, declaration: &QueueDeclaration) -> Result<()> {
    match state.queues.get(&declaration.name) {
        Some(existing) => {
            if declaration.passive {
                return Ok(());
            }
            let current = &existing.declaration;
            if current.durable != declaration.durable
                || current.exclusive != declaration.exclusive
                || current.auto_delete != declaration.auto_delete
            {
                return Err(LoggerError::declare(
                    "queue",
                    declaration.name.clone(),
                    "PRECONDITION_FAILED - inequivalent arguments for existing queue",
                ));
            }
            Ok(())
        }
        None if declaration.passive => Err(LoggerError::declare(
            "queue",
            declaration.name.clone(),
            "NOT_FOUND - no queue with this name",
        )),
        None => {
            state.queues.insert(
                declaration.name.clone(),
                MemoryQueue {
                    declaration: declaration.clone(),
                    messages: Vec::new(),
                },
            );
            Ok(())
        }
    }
}

impl Broker for MemoryBroker {
    fn connect(&self, endpoint: &BrokerEndpoint) -> Result<Box<dyn BrokerChannel>> {
        let mut state = self.state.lock();
        state.connect_attempts += 1;

        if state.unreachable {
            return Err(LoggerError::connection(
                endpoint.to_string(),
                "connection refused",
            ));
        }
        if let Some((username, password)) = &state.credentials {
            if *username != endpoint.username || *password != endpoint.password {
                return Err(LoggerError::connection(
                    endpoint.to_string(),
                    "ACCESS_REFUSED - login was refused",
                ));
            }
        }

        state.open_channels += 1;
        Ok(Box::new(MemoryChannel {
            state: Arc::clone(&self.state),
            generation: state.generation,
            endpoint: endpoint.to_string(),
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryChannel {
    state: Arc<Mutex<MemoryState>>,
    generation: u64,
    endpoint: String,
}

impl MemoryChannel {
    fn check_alive(&self, state: &MemoryState) -> Result<()> {
        if state.generation != self.generation {
            return Err(LoggerError::connection(
                self.endpoint.clone(),
                "CONNECTION_FORCED - broker restarted",
            ));
        }
        Ok(())
    }
}

impl BrokerChannel for MemoryChannel {
    fn declare_exchange(&mut self, declaration: &ExchangeDeclaration) -> Result<()> {
        let mut state = self.state.lock();
        self.check_alive(&state)?;
        declare_exchange_locked(&mut state, declaration)
    }

    fn declare_queue(&mut self, declaration: &QueueDeclaration) -> Result<()> {
        let mut state = self.state.lock();
        self.check_alive(&state)?;
        declare_queue_locked(&mut state, declaration)
    }

    fn publish(&mut self, delivery: &Delivery<'_>, body: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return Err(LoggerError::publish(
                delivery.destination(),
                "channel closed by broker restart",
            ));
        }
        if state.fail_publish {
            return Err(LoggerError::publish(
                delivery.destination(),
                "broker rejected publish",
            ));
        }

        let message = StoredMessage {
            exchange: delivery.exchange.to_string(),
            routing_key: delivery.routing_key.to_string(),
            body: body.to_vec(),
            persistent: delivery.persistent,
            content_type: delivery.content_type.to_string(),
        };

        let targets: Vec<String> = if delivery.exchange.is_empty() {
            if state.queues.contains_key(delivery.routing_key) {
                vec![delivery.routing_key.to_string()]
            } else {
                Vec::new()
            }
        } else {
            if !state.exchanges.contains_key(delivery.exchange) {
                return Err(LoggerError::publish(
                    delivery.exchange,
                    format!("NOT_FOUND - no exchange '{}'", delivery.exchange),
                ));
            }
            state
                .bindings
                .get(delivery.exchange)
                .cloned()
                .unwrap_or_default()
        };

        if targets.is_empty() {
            state.dropped += 1;
            return Ok(());
        }

        for name in targets {
            if let Some(queue) = state.queues.get_mut(&name) {
                queue.messages.push(message.clone());
            }
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.open_channels = state.open_channels.saturating_sub(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::JSON_CONTENT_TYPE;

    fn delivery<'a>(exchange: &'a str, routing_key: &'a str, persistent: bool) -> Delivery<'a> {
        Delivery {
            exchange,
            routing_key,
            persistent,
            content_type: JSON_CONTENT_TYPE,
        }
    }

    fn open(broker: &MemoryBroker) -> Box<dyn BrokerChannel> {
        broker.connect(&BrokerEndpoint::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_credentials() {
        let broker = MemoryBroker::new().with_credentials("app", "secret");
        let endpoint = BrokerEndpoint::new("mq", 5672, "app", "wrong");

        let err = broker.connect(&endpoint).err().unwrap();
        assert!(matches!(err, LoggerError::Connection { .. }));
        assert!(!err.to_string().contains("wrong"));
        assert_eq!(broker.connect_attempts(), 1);
        assert_eq!(broker.open_channels(), 0);
    }

    #[test]
    fn test_declare_is_idempotent_but_checks_flags() {
        let broker = MemoryBroker::new();
        let mut channel = open(&broker);
        let logs = QueueDeclaration::durable("logs");

        channel.declare_queue(&logs).unwrap();
        channel.declare_queue(&logs).unwrap();

        let mut transient = logs.clone();
        transient.durable = false;
        let err = channel.declare_queue(&transient).unwrap_err();
        assert!(matches!(err, LoggerError::Declare { .. }));

        let mut passive = ExchangeDeclaration::fanout("missing");
        passive.passive = true;
        assert!(channel.declare_exchange(&passive).is_err());
    }

    #[test]
    fn test_fanout_copies_to_every_subscriber() {
        let broker = MemoryBroker::new();
        let mut channel = open(&broker);
        let events = ExchangeDeclaration::fanout("events");
        channel.declare_exchange(&events).unwrap();

        let to_events = delivery("events", "", false);
        channel.publish(&to_events, b"{}").unwrap();
        assert_eq!(broker.dropped_count(), 1);

        let first = broker.subscribe("events").unwrap();
        let second = broker.subscribe("events").unwrap();
        channel.publish(&to_events, b"{}").unwrap();

        assert_eq!(broker.queue_len(&first), 1);
        assert_eq!(broker.queue_len(&second), 1);
        assert_eq!(broker.dropped_count(), 1);
    }

    #[test]
    fn test_publish_to_undeclared_exchange_fails() {
        let broker = MemoryBroker::new();
        let mut channel = open(&broker);

        let nowhere = delivery("nowhere", "", false);
        let err = channel.publish(&nowhere, b"{}").unwrap_err();
        assert!(matches!(err, LoggerError::Publish { .. }));
    }

    #[test]
    fn test_restart_keeps_only_durable_persistent_state() {
        let broker = MemoryBroker::new();
        let mut channel = open(&broker);
        let logs = QueueDeclaration::durable("logs");
        let events = ExchangeDeclaration::fanout("events");
        channel.declare_queue(&logs).unwrap();
        channel.declare_exchange(&events).unwrap();
        let subscriber = broker.subscribe("events").unwrap();

        let persistent = delivery("", "logs", true);
        let transient = delivery("", "logs", false);
        let broadcast = delivery("events", "", false);
        channel.publish(&persistent, b"kept").unwrap();
        channel.publish(&transient, b"lost").unwrap();
        channel.publish(&broadcast, b"gone").unwrap();

        broker.restart();

        let messages = broker.messages("logs");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, b"kept");
        assert!(!broker.exchange_exists("events"));
        assert!(!broker.queue_exists(&subscriber));
        assert!(channel.publish(&persistent, b"late").is_err());
    }
}
