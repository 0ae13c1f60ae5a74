//! Connect-once channel management
//!
//! The manager owns the only channel a logger ever uses. Connecting,
//! declaring and publishing all happen under one mutex, so concurrent first
//! calls produce a single connection and writes on the channel never
//! interleave.

use super::config::BrokerEndpoint;
use super::error::{LoggerError, Result};
use super::metrics::LoggerMetrics;
use crate::topology::Topology;
use crate::transport::{Broker, BrokerChannel};
use parking_lot::Mutex;
use std::sync::Arc;

enum ConnectionState {
    Idle,
    Ready(Box<dyn BrokerChannel>),
    Closed,
}

pub struct ConnectionManager {
    broker: Arc<dyn Broker>,
    endpoint: BrokerEndpoint,
    state: Mutex<ConnectionState>,
    metrics: Arc<LoggerMetrics>,
}

impl ConnectionManager {
    pub fn new(
        broker: Arc<dyn Broker>,
        endpoint: BrokerEndpoint,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        Self {
            broker,
            endpoint,
            state: Mutex::new(ConnectionState::Idle),
            metrics,
        }
    }

    pub fn endpoint(&self) -> &BrokerEndpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Ready(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Closed)
    }

    /// Connect and declare `topology` unless already done
    pub fn ensure_ready(&self, topology: &dyn Topology) -> Result<()> {
        self.with_channel(topology, |_| Ok(()))
    }

    /// Run `f` on the shared channel, connecting first if needed
    ///
    /// The lock is held for the whole call.
    pub fn with_channel<R, F>(&self, topology: &dyn Topology, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn BrokerChannel) -> Result<R>,
    {
        let mut state = self.state.lock();

        if let ConnectionState::Idle = *state {
            let channel = self.open(topology)?;
            *state = ConnectionState::Ready(channel);
        }

        match &mut *state {
            ConnectionState::Ready(channel) => f(channel.as_mut()),
            ConnectionState::Closed => Err(LoggerError::LoggerClosed),
            ConnectionState::Idle => Err(LoggerError::other("connection not established")),
        }
    }

    fn open(&self, topology: &dyn Topology) -> Result<Box<dyn BrokerChannel>> {
        self.metrics.record_connect_attempt();
        tracing::debug!(
            broker = self.broker.name(),
            endpoint = %self.endpoint,
            destination = topology.destination(),
            "connecting to broker"
        );

        let mut channel = self.broker.connect(&self.endpoint)?;

        if let Err(e) = topology.declare(channel.as_mut()) {
            if let Err(close_err) = channel.close() {
                tracing::debug!(error = %close_err, "closing channel after failed declare");
            }
            return Err(e);
        }

        self.metrics.record_connection_opened();
        tracing::debug!(
            endpoint = %self.endpoint,
            destination = topology.destination(),
            "broker channel ready"
        );
        Ok(channel)
    }

    /// Close the channel; later calls fail with [`LoggerError::LoggerClosed`]
    pub fn close(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        match previous {
            ConnectionState::Ready(channel) => {
                tracing::debug!(endpoint = %self.endpoint, "closing broker channel");
                channel.close()
            }
            ConnectionState::Idle | ConnectionState::Closed => Ok(()),
        }
    }
}
