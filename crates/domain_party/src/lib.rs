//! Party Domain
//!
//! This crate holds the customer entity. Customer master data lives in the
//! external CRM; what this system keeps is the stable customer number, a
//! cached CRM contact snapshot, and the sync bookkeeping needed to mirror
//! a derived contact record into the invoicing provider.
//!
//! # Examples
//!
//! ```rust
//! use domain_party::Customer;
//! use core_kernel::audit::Actor;
//! use serde_json::json;
//!
//! let mut customer = Customer::new(1001, None, Actor::System, chrono::Utc::now());
//! customer.apply_crm_snapshot(
//!     json!({
//!         "company_name": "ACME GmbH",
//!         "street": "Hauptstrasse",
//!         "houseno": "12",
//!         "zip": "10115",
//!         "city": "Berlin",
//!         "country": "Deutschland",
//!         "tel": "030 1234",
//!         "ustid": "DE123456789",
//!         "email": "billing@acme.example",
//!     }),
//!     Actor::System,
//!     chrono::Utc::now(),
//! );
//! assert!(customer.provider_payload().is_some());
//! ```

pub mod customer;

pub use customer::Customer;
