//! Broker notifications
//!
//! Contract changes are announced on a message broker for downstream
//! systems (provisioning, monitoring). Delivery is best effort: a sink
//! without broker configuration logs the message and reports success, so
//! domain flows never block on the broker.
//!
//! Exchange names are environment-prefixed ("gw.contracts" in
//! production, "gw-dev.contracts" elsewhere) and validated against the
//! allowed set; publishing to an unknown exchange is a bug, not a
//! runtime condition to tolerate.

use async_trait::async_trait;
use core_kernel::ports::{DomainPort, PortError};
use domain_contracts::events::{ContractEvent, CONTRACTS_EXCHANGE};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Exchanges this system publishes to
pub const ALLOWED_EXCHANGES: [&str; 2] = ["billing", "contracts"];

/// Minimal broker abstraction; one call per message
#[async_trait]
pub trait MessageBroker: DomainPort {
    async fn publish(&self, exchange: &str, message: &Value) -> Result<(), PortError>;
}

/// Fire-and-forget publisher for domain notifications
pub struct NotificationSink {
    broker: Option<Arc<dyn MessageBroker>>,
    /// Environment prefix for exchange names, e.g. "gw" or "gw-dev"
    environment: String,
    /// Source prefix for the message envelope, e.g. "ccdb"
    source: String,
}

impl NotificationSink {
    pub fn new(
        broker: Option<Arc<dyn MessageBroker>>,
        environment: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            environment: environment.into(),
            source: source.into(),
        }
    }

    /// A sink that logs instead of publishing
    pub fn disabled() -> Self {
        Self::new(None, "gw-dev", "ccdb")
    }

    fn exchange_name(&self, exchange: &str) -> Result<String, PortError> {
        if !ALLOWED_EXCHANGES.contains(&exchange) {
            return Err(PortError::validation(format!(
                "invalid exchange: {exchange}, must be one of {ALLOWED_EXCHANGES:?}"
            )));
        }
        if exchange.starts_with(&self.environment) {
            Ok(exchange.to_string())
        } else {
            Ok(format!("{}.{exchange}", self.environment))
        }
    }

    fn qualified_source(&self, source: &str) -> String {
        if source.starts_with(&self.source) {
            source.to_string()
        } else {
            format!("{}.{source}", self.source)
        }
    }

    /// Publishes one envelope; without a broker it logs and succeeds
    pub async fn publish(
        &self,
        exchange: &str,
        message_type: &str,
        source: &str,
        payload: Value,
    ) -> Result<(), PortError> {
        let exchange = self.exchange_name(exchange)?;
        let message = json!({
            "type": message_type,
            "source": self.qualified_source(source),
            "payload": payload,
        });

        match &self.broker {
            None => {
                warn!(exchange, message_type, "no broker configured, not sending message");
                debug!(%message, "message would have been");
                Ok(())
            }
            Some(broker) => broker.publish(&exchange, &message).await,
        }
    }

    /// Publishes a contract change on the contracts exchange
    pub async fn publish_contract_event(&self, event: &ContractEvent) -> Result<(), PortError> {
        self.publish(
            CONTRACTS_EXCHANGE,
            event.message_type(),
            event.source(),
            event.payload(),
        )
        .await
    }

    /// Drains and publishes every pending event of a directory
    ///
    /// Returns the number of published events; a failing publish stops
    /// the drain and surfaces the error with the remaining events lost,
    /// matching the fire-and-forget contract.
    pub async fn publish_all(
        &self,
        events: Vec<ContractEvent>,
    ) -> Result<usize, PortError> {
        let mut published = 0;
        for event in &events {
            self.publish_contract_event(event).await?;
            published += 1;
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_names_are_environment_prefixed() {
        let sink = NotificationSink::new(None, "gw", "ccdb");
        assert_eq!(sink.exchange_name("contracts").unwrap(), "gw.contracts");
        assert_eq!(sink.exchange_name("billing").unwrap(), "gw.billing");
    }

    #[test]
    fn test_unknown_exchanges_are_rejected() {
        let sink = NotificationSink::disabled();
        assert!(sink.exchange_name("customers").is_err());
    }

    #[test]
    fn test_sources_are_prefixed_once() {
        let sink = NotificationSink::new(None, "gw", "ccdb");
        assert_eq!(sink.qualified_source("contract"), "ccdb.contract");
        assert_eq!(sink.qualified_source("ccdb.contract"), "ccdb.contract");
    }
}
