//! Contract Domain
//!
//! Contracts, their billable items, and the rules that govern their
//! lifecycle: term policies with minimum duration, notice period, and
//! automatic extension, validity intervals with inclusive ends, and the
//! cancelation arithmetic built on them.
//!
//! The [`ContractDirectory`] is the in-memory arena holding contracts
//! and items under stable business numbers. Every mutation made through
//! the directory leaves a [`events::ContractEvent`] for downstream
//! consumers.
//!
//! # Examples
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use core_kernel::audit::Actor;
//! use core_kernel::temporal::TermPolicy;
//! use core_kernel::BookingAccountId;
//! use domain_contracts::{Contract, ContractDirectory};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let mut directory = ContractDirectory::new();
//! let contract = Contract::new(
//!     0,
//!     BookingAccountId::new(),
//!     "Colocation Rack 42",
//!     NaiveDate::from_ymd_opt(2022, 9, 7).unwrap(),
//!     TermPolicy::new(1, 3, 12),
//!     Actor::System,
//!     Utc::now(),
//! );
//! let number = directory.insert_contract(contract, today).unwrap();
//! let till = directory
//!     .cancel_contract(number, today, None, Actor::System, Utc::now())
//!     .unwrap();
//! assert_eq!(till, NaiveDate::from_ymd_opt(2024, 10, 31).unwrap());
//! ```

pub mod contract;
pub mod contract_item;
pub mod directory;
pub mod error;
pub mod events;
pub mod extension;

pub use contract::{Contract, PaymentProfile};
pub use contract_item::{AccountingPeriod, BillingType, ContractItem, ServiceStatus};
pub use directory::ContractDirectory;
pub use error::ContractError;
pub use events::ContractEvent;
pub use extension::{run_extensions, ExtensionReport};
