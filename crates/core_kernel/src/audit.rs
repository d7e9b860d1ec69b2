//! Actor identity and change auditing
//!
//! Every mutating operation names the actor that performed it, either a
//! human user or the system itself (scheduled runs, sync sweeps). Change
//! records are produced by diffing entity snapshots taken before and after
//! an edit, so the audit trail never depends on callers remembering to
//! list the fields they touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who performed an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// Scheduled jobs, sync sweeps, migrations
    System,
    /// A named human user
    User { username: String },
}

impl Actor {
    pub fn user(username: impl Into<String>) -> Self {
        Actor::User {
            username: username.into(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => write!(f, "system"),
            Actor::User { username } => write!(f, "{username}"),
        }
    }
}

/// Creation and last-modification stamp carried by audited entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_at: DateTime<Utc>,
    pub created_by: Actor,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Actor,
}

impl AuditStamp {
    pub fn new(actor: Actor, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: actor.clone(),
            updated_at: now,
            updated_by: actor,
        }
    }

    /// Records a modification
    pub fn touch(&mut self, actor: Actor, now: DateTime<Utc>) {
        self.updated_at = now;
        self.updated_by = actor;
    }
}

/// A single changed field, with its value before and after the edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

/// Compares two entity snapshots field by field
///
/// Both snapshots must be JSON objects; fields absent on one side diff
/// against `null`. The result is sorted by field name so audit records
/// are stable.
pub fn diff_snapshots(before: &Value, after: &Value) -> Vec<FieldDiff> {
    let empty = serde_json::Map::new();
    let before_map = before.as_object().unwrap_or(&empty);
    let after_map = after.as_object().unwrap_or(&empty);

    let mut fields: Vec<&String> = before_map.keys().chain(after_map.keys()).collect();
    fields.sort();
    fields.dedup();

    fields
        .into_iter()
        .filter_map(|field| {
            let old = before_map.get(field).cloned().unwrap_or(Value::Null);
            let new = after_map.get(field).cloned().unwrap_or(Value::Null);
            if old != new {
                Some(FieldDiff {
                    field: field.clone(),
                    before: old,
                    after: new,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_stamp_touch() {
        let t0 = Utc::now();
        let mut stamp = AuditStamp::new(Actor::System, t0);
        assert_eq!(stamp.created_by, Actor::System);

        let t1 = t0 + chrono::Duration::seconds(5);
        stamp.touch(Actor::user("clerk"), t1);
        assert_eq!(stamp.created_at, t0);
        assert_eq!(stamp.updated_at, t1);
        assert_eq!(stamp.updated_by, Actor::user("clerk"));
    }

    #[test]
    fn test_diff_finds_changed_fields() {
        let before = json!({"name": "ACME", "city": "Berlin", "zip": "10115"});
        let after = json!({"name": "ACME GmbH", "city": "Berlin", "zip": "10115"});

        let diffs = diff_snapshots(&before, &after);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "name");
        assert_eq!(diffs[0].before, json!("ACME"));
        assert_eq!(diffs[0].after, json!("ACME GmbH"));
    }

    #[test]
    fn test_diff_handles_added_and_removed_fields() {
        let before = json!({"name": "ACME", "phone": "030 1234"});
        let after = json!({"name": "ACME", "email": "info@acme.example"});

        let diffs = diff_snapshots(&before, &after);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].field, "email");
        assert_eq!(diffs[0].before, Value::Null);
        assert_eq!(diffs[1].field, "phone");
        assert_eq!(diffs[1].after, Value::Null);
    }

    #[test]
    fn test_diff_identical_snapshots_is_empty() {
        let snap = json!({"a": 1, "b": [1, 2]});
        assert!(diff_snapshots(&snap, &snap).is_empty());
    }
}
