//! Ports infrastructure for external systems
//!
//! Domain crates talk to the outside world (the invoicing provider, the
//! message broker) through port traits defined on top of the types here.
//! Adapters implement those traits; the domain only ever sees [`PortError`].
//!
//! Entities that are mirrored into the external invoicing provider carry a
//! [`SyncInfo`] and implement [`Syncable`]. The sync state machine is:
//!
//! ```text
//! Unsynced ──push──▶ Pending ──ok──▶ Synced ──local edit──▶ Dirty
//!     ▲                  │                                    │
//!     └──────revert──────┘◀──────────────push────────────────┘
//! ```
//!
//! A failed push reverts to whatever state the entity had before, so the
//! next sweep picks it up again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data or an in-flight push
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded for the external API
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The external system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// A data transformation error occurred
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Retry configuration for transient failures against external APIs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial call
    pub max_retries: u32,
    /// Base delay in milliseconds (exponential backoff base)
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Returns the backoff delay before the given retry attempt (0-based)
    ///
    /// When the provider answers with an explicit retry-after, callers
    /// should prefer that over the computed delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Synchronization state of an entity mirrored into the external provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never pushed to the provider
    Unsynced,
    /// Pushed before, but local fields changed since
    Dirty,
    /// A push is in flight
    Pending,
    /// Provider copy matches the last pushed snapshot
    Synced,
}

impl SyncState {
    /// Returns true if a sweep should push this entity
    pub fn needs_push(&self) -> bool {
        matches!(self, SyncState::Unsynced | SyncState::Dirty)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Unsynced => "unsynced",
            SyncState::Dirty => "dirty",
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
        };
        write!(f, "{s}")
    }
}

/// Provider-side bookkeeping carried by every syncable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncInfo {
    /// Identifier assigned by the provider, once pushed
    pub provider_id: Option<i64>,
    /// The payload as it looked when last pushed successfully
    pub synced_snapshot: serde_json::Value,
    pub state: SyncState,
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncInfo {
    pub fn new() -> Self {
        Self {
            provider_id: None,
            synced_snapshot: serde_json::Value::Null,
            state: SyncState::Unsynced,
            last_sync: None,
        }
    }

    /// Marks a push as in flight and returns the prior state
    ///
    /// Refuses to start a second push while one is pending; the caller
    /// keeps the returned state to [`SyncInfo::revert`] on failure.
    pub fn begin_push(&mut self) -> Result<SyncState, PortError> {
        if self.state == SyncState::Pending {
            return Err(PortError::conflict("push already in flight"));
        }
        let prior = self.state;
        self.state = SyncState::Pending;
        Ok(prior)
    }

    /// Records a successful push
    pub fn complete_push(
        &mut self,
        provider_id: i64,
        snapshot: serde_json::Value,
        now: DateTime<Utc>,
    ) {
        self.provider_id = Some(provider_id);
        self.synced_snapshot = snapshot;
        self.state = SyncState::Synced;
        self.last_sync = Some(now);
    }

    /// Rolls the state back after a failed push
    pub fn revert(&mut self, prior: SyncState) {
        self.state = prior;
    }

    /// Flips a synced entity to dirty when its payload no longer matches
    /// the last pushed snapshot
    pub fn mark_dirty_if_changed(&mut self, payload: &serde_json::Value) {
        if self.state == SyncState::Synced && *payload != self.synced_snapshot {
            self.state = SyncState::Dirty;
        }
    }
}

impl Default for SyncInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Implemented by entities mirrored into the external invoicing provider
pub trait Syncable {
    fn sync_info(&self) -> &SyncInfo;

    fn sync_info_mut(&mut self) -> &mut SyncInfo;

    /// The provider-facing payload built from the current local fields
    fn sync_payload(&self) -> serde_json::Value;
}
