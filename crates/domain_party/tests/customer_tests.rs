//! Integration tests for the customer entity

use chrono::Utc;
use core_kernel::audit::Actor;
use core_kernel::ports::{SyncState, Syncable};
use domain_party::Customer;
use serde_json::{json, Value};

fn full_snapshot(company: &str) -> Value {
    json!({
        "company_name": company,
        "street": "Hauptstrasse",
        "houseno": "12",
        "housenoadd": null,
        "zip": "10115",
        "city": "Berlin",
        "country": "Deutschland",
        "tel": "030 1234",
        "ustid": "DE123456789",
        "email": "billing@acme.example",
    })
}

#[test]
fn test_new_customer_is_unsynced() {
    let customer = Customer::new(1001, None, Actor::System, Utc::now());
    assert_eq!(customer.sync.state, SyncState::Unsynced);
    assert!(customer.sync.state.needs_push());
    assert_eq!(customer.number(), 1001);
}

#[test]
fn test_unchanged_snapshot_keeps_synced_state() {
    let mut customer = Customer::new(1001, None, Actor::System, Utc::now());
    customer.apply_crm_snapshot(full_snapshot("ACME GmbH"), Actor::System, Utc::now());

    let payload = customer.sync_payload();
    customer.sync.complete_push(42, payload, Utc::now());
    assert_eq!(customer.sync.state, SyncState::Synced);

    // Re-applying the identical record must not create sync churn.
    customer.apply_crm_snapshot(full_snapshot("ACME GmbH"), Actor::System, Utc::now());
    assert_eq!(customer.sync.state, SyncState::Synced);
}

#[test]
fn test_changed_snapshot_flips_to_dirty() {
    let mut customer = Customer::new(1001, None, Actor::System, Utc::now());
    customer.apply_crm_snapshot(full_snapshot("ACME GmbH"), Actor::System, Utc::now());

    let payload = customer.sync_payload();
    customer.sync.complete_push(42, payload, Utc::now());

    customer.apply_crm_snapshot(full_snapshot("ACME AG"), Actor::System, Utc::now());
    assert_eq!(customer.sync.state, SyncState::Dirty);
    assert_eq!(customer.name.as_deref(), Some("ACME AG"));
}

#[test]
fn test_customer_serialization_roundtrip() {
    let mut customer = Customer::new(1001, None, Actor::System, Utc::now());
    customer.apply_crm_snapshot(full_snapshot("ACME GmbH"), Actor::System, Utc::now());

    let json = serde_json::to_string(&customer).unwrap();
    let back: Customer = serde_json::from_str(&json).unwrap();
    assert_eq!(back.number(), 1001);
    assert_eq!(back.name.as_deref(), Some("ACME GmbH"));
    assert_eq!(back.provider_payload(), customer.provider_payload());
}
