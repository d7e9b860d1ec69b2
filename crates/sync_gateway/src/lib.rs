//! Outbound Gateway
//!
//! Everything that leaves this system goes through here: mirroring
//! customers, booking accounts, and invoices into the external invoicing
//! provider, and announcing contract changes on the message broker.
//!
//! The domain crates stay free of transport concerns; they expose
//! payloads and sync state, and this crate drives the conversations.

pub mod provider;
pub mod queue;

pub use provider::{
    BillingProviderPort, InvoiceReceipt, ProviderConfig, ProviderGateway, ProviderTransport,
    SyncService,
};
pub use queue::{MessageBroker, NotificationSink, ALLOWED_EXCHANGES};
