//! Broadcast to every current subscriber of a fanout exchange
//!
//! Messages are transient. With nobody bound to the exchange the broker
//! drops them, which is the expected behaviour and not an error.

use super::Topology;
use crate::core::Result;
use crate::transport::{BrokerChannel, Delivery, ExchangeDeclaration, JSON_CONTENT_TYPE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutExchange {
    declaration: ExchangeDeclaration,
}

impl FanoutExchange {
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            declaration: ExchangeDeclaration::fanout(exchange),
        }
    }

    pub fn declaration(&self) -> &ExchangeDeclaration {
        &self.declaration
    }
}

impl Topology for FanoutExchange {
    fn destination(&self) -> &str {
        &self.declaration.name
    }

    fn declare(&self, channel: &mut dyn BrokerChannel) -> Result<()> {
        channel.declare_exchange(&self.declaration)
    }

    fn delivery(&self) -> Delivery<'_> {
        Delivery {
            exchange: &self.declaration.name,
            routing_key: "",
            persistent: false,
            content_type: JSON_CONTENT_TYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ExchangeKind;

    #[test]
    fn test_declares_transient_fanout() {
        let topology = FanoutExchange::new("events");
        let decl = topology.declaration();
        assert_eq!(decl.kind, ExchangeKind::Fanout);
        assert!(!decl.passive);
        assert!(!decl.durable);
        assert!(!decl.auto_delete);
    }

    #[test]
    fn test_delivery_is_transient_and_untagged() {
        let topology = FanoutExchange::new("events");
        let delivery = topology.delivery();
        assert_eq!(delivery.exchange, "events");
        assert!(!delivery.persistent);
        assert!(topology.source_for(Some("svc")).is_none());
    }
}
