//! Billing Domain
//!
//! Booking accounts with their payment setup, locally drafted invoices,
//! month-based proration, and the invoicing engine that turns due
//! contract items into invoices.
//!
//! Invoices drafted here carry no number; numbering, document rendering,
//! and delivery belong to the external invoicing provider and happen
//! through the gateway crate.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use domain_billing::billable_months;
//! use rust_decimal_macros::dec;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! assert_eq!(billable_months(start, end), dec!(1.52));
//! ```

pub mod account;
pub mod engine;
pub mod invoice;
pub mod proration;

pub use account::{BookingAccount, InvoiceFormat, PaymentMethod, SepaMandate, TaxOption};
pub use engine::{next_interval_start, run_invoicing, InvoiceBook, InvoicingReport};
pub use invoice::{Invoice, InvoiceItem, SepaSequence};
pub use proration::billable_months;
