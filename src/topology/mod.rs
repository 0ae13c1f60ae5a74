//! Delivery topologies
//!
//! The two loggers differ only here: what gets declared on the broker, how
//! a record is routed and flagged, and whether records carry a source tag.

pub mod exchange;
pub mod queue;

pub use exchange::FanoutExchange;
pub use queue::DurableQueue;

use crate::core::{LogRecord, Result, SourceTag};
use crate::transport::{BrokerChannel, Delivery};
use std::fmt;

pub trait Topology: Send + Sync + fmt::Debug {
    /// Exchange or queue name
    fn destination(&self) -> &str;

    /// Declare the destination if absent
    fn declare(&self, channel: &mut dyn BrokerChannel) -> Result<()>;

    fn delivery(&self) -> Delivery<'_>;

    /// Source tag for a record, given an optional per-call override
    fn source_for(&self, _per_call: Option<&str>) -> Option<SourceTag> {
        None
    }

    /// Serialize and publish one record
    fn publish(&self, channel: &mut dyn BrokerChannel, record: &LogRecord) -> Result<()> {
        let body = record.to_json_bytes()?;
        channel.publish(&self.delivery(), &body)
    }
}
