//! Point-to-point delivery into a durable queue
//!
//! Records are published through the default exchange with the queue name
//! as routing key and the persistent delivery mode, so they survive a broker
//! restart until a consumer takes them.

use super::Topology;
use crate::core::{Result, SourceTag};
use crate::transport::{BrokerChannel, Delivery, QueueDeclaration, JSON_CONTENT_TYPE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurableQueue {
    declaration: QueueDeclaration,
    source: Option<String>,
    default_source: Option<String>,
}

impl DurableQueue {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            declaration: QueueDeclaration::durable(queue),
            source: None,
            default_source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_default_source(mut self, default_source: Option<String>) -> Self {
        self.default_source = default_source;
        self
    }

    pub fn declaration(&self) -> &QueueDeclaration {
        &self.declaration
    }

    /// The tag used when a call does not name its own
    pub fn source(&self) -> SourceTag {
        self.resolve(None)
    }

    fn resolve(&self, per_call: Option<&str>) -> SourceTag {
        let explicit = per_call
            .filter(|s| !s.is_empty())
            .or(self.source.as_deref());
        SourceTag::resolve(explicit, self.default_source.as_deref())
    }
}

impl Topology for DurableQueue {
    fn destination(&self) -> &str {
        &self.declaration.name
    }

    fn declare(&self, channel: &mut dyn BrokerChannel) -> Result<()> {
        channel.declare_queue(&self.declaration)
    }

    fn delivery(&self) -> Delivery<'_> {
        Delivery {
            exchange: "",
            routing_key: &self.declaration.name,
            persistent: true,
            content_type: JSON_CONTENT_TYPE,
        }
    }

    fn source_for(&self, per_call: Option<&str>) -> Option<SourceTag> {
        Some(self.resolve(per_call))
    }
}
