//! Customer entity
//!
//! Customers are owned by the external CRM; this system caches the last
//! CRM contact snapshot and mirrors a derived contact record into the
//! invoicing provider. The customer number is the stable business key
//! shared with both external systems and never changes once assigned.
//!
//! Two CRM snapshot schemes are in circulation: the current one uses
//! English field names, the legacy one German ones. Payload derivation
//! accepts both.

use chrono::{DateTime, Utc};
use core_kernel::audit::{diff_snapshots, Actor, AuditStamp, FieldDiff};
use core_kernel::identifiers::CustomerId;
use core_kernel::ports::{SyncInfo, Syncable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A customer mirrored from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Stable business key, shared with CRM and invoicing provider
    number: u32,
    pub name: Option<String>,
    /// Raw contact record as last pulled from the CRM
    pub crm_snapshot: Value,
    pub crm_last_sync: Option<DateTime<Utc>>,
    pub sync: SyncInfo,
    pub audit: AuditStamp,
}

impl Customer {
    pub fn new(number: u32, name: Option<String>, actor: Actor, now: DateTime<Utc>) -> Self {
        Self {
            id: CustomerId::new_v7(),
            number,
            name,
            crm_snapshot: Value::Null,
            crm_last_sync: None,
            sync: SyncInfo::new(),
            audit: AuditStamp::new(actor, now),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Stores a fresh CRM contact record
    ///
    /// The display name follows the CRM. If the derived provider payload
    /// changed, the sync state flips to dirty so the next sweep pushes it.
    /// Returns the field-level changes to the derived contact record so
    /// the caller can write them to its change log.
    pub fn apply_crm_snapshot(
        &mut self,
        snapshot: Value,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Vec<FieldDiff> {
        let before = self.sync_payload();
        if let Some(name) = snapshot
            .get("company_name")
            .or_else(|| snapshot.get("firmierung"))
            .and_then(Value::as_str)
        {
            self.name = Some(name.to_string());
        }
        self.crm_snapshot = snapshot;
        self.crm_last_sync = Some(now);
        self.audit.touch(actor, now);

        let payload = self.sync_payload();
        self.sync.mark_dirty_if_changed(&payload);
        diff_snapshots(&before, &payload)
    }

    /// Builds the contact record pushed to the invoicing provider
    ///
    /// Returns None while the CRM snapshot is missing or too sparse to
    /// produce a usable contact (no company name or street); such
    /// customers are skipped by the sync sweep rather than failed.
    pub fn provider_payload(&self) -> Option<Value> {
        let data = self.crm_snapshot.as_object()?;
        let legacy = data.contains_key("firmierung");
        if !legacy && !data.contains_key("company_name") {
            return None;
        }

        let field = |key: &str| -> Option<&str> { data.get(key).and_then(Value::as_str) };

        let (country, street, street_number, suffix, zip_code, city, phone) = if legacy {
            (
                field("land"),
                field("strasse"),
                field("hausnummer"),
                field("zusatz"),
                field("plz"),
                field("ort"),
                field("telefon"),
            )
        } else {
            (
                field("country"),
                field("street"),
                field("houseno"),
                field("housenoadd"),
                field("zip"),
                field("city"),
                field("tel"),
            )
        };

        let name = self.name.as_deref()?;
        let street_line = format!(
            "{} {}",
            street.unwrap_or("").trim(),
            street_number.unwrap_or("")
        );
        let street_line = street_line.trim().to_string();
        if name.is_empty() || street_line.is_empty() {
            return None;
        }

        let country_code = match country {
            Some("Deutschland") => "DE",
            Some("Luxembourg") => "LU",
            _ => "DE",
        };
        let emails = match field("email") {
            Some(email) if !email.is_empty() => json!([email]),
            _ => Value::Null,
        };

        Some(json!({
            "company_name": name,
            "display_name": name,
            "last_name": "",
            "number": self.number.to_string(),
            "vat_identifier": field("ustid"),
            "emails": emails,
            "country": country_code,
            "street": street_line,
            "suffix_1": suffix,
            "zip_code": zip_code,
            "city": city,
            "phone_1": phone,
        }))
    }
}

impl Syncable for Customer {
    fn sync_info(&self) -> &SyncInfo {
        &self.sync
    }

    fn sync_info_mut(&mut self) -> &mut SyncInfo {
        &mut self.sync
    }

    fn sync_payload(&self) -> Value {
        self.provider_payload().unwrap_or(Value::Null)
    }
}
