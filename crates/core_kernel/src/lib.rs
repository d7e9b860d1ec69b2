//! Core Kernel - Foundational types and utilities for the contract billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Calendar arithmetic and validity intervals
//! - Strongly-typed identifiers
//! - Sync and queue port infrastructure
//! - Actor identity, snapshot diffing, and the operational log

pub mod audit;
pub mod identifiers;
pub mod money;
pub mod oplog;
pub mod ports;
pub mod temporal;

pub use audit::{diff_snapshots, Actor, AuditStamp, FieldDiff};
pub use identifiers::{
    BookingAccountId, ContractId, ContractItemId, CustomerId, InvoiceId, InvoiceItemId,
    LogEntryId, MandateId,
};
pub use money::{Currency, Money, MoneyError, Rate};
pub use oplog::{LogEntry, LogLevel, OperationalLog};
pub use ports::{
    DomainPort, PortError, RetryPolicy, SyncInfo, SyncState, Syncable,
};
pub use temporal::{
    add_months, days_in_month, end_of_month, first_of_month, months_between, DateInterval,
    TemporalError, TermPolicy,
};
