//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the billing
//! system. These fixtures are designed to be consistent and predictable
//! for unit tests.

use chrono::NaiveDate;
use core_kernel::temporal::TermPolicy;
use core_kernel::{BookingAccountId, ContractId, CustomerId, Currency, Money, Rate};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard recurring price for a colocation rack
    pub fn eur_rack_price() -> Money {
        Money::new(dec!(199.00), Currency::EUR)
    }

    /// Standard one-time setup fee
    pub fn eur_setup_fee() -> Money {
        Money::new(dec!(49.00), Currency::EUR)
    }

    /// Small recurring price for add-on items
    pub fn eur_addon_price() -> Money {
        Money::new(dec!(9.90), Currency::EUR)
    }

    /// Creates a zero amount
    pub fn eur_zero() -> Money {
        Money::zero(Currency::EUR)
    }

    /// Creates a USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Creates a negative amount for credit scenarios
    pub fn eur_credit() -> Money {
        Money::new(dec!(-50.00), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard contract start, mid-month to exercise proration
    pub fn contract_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    /// First regular billing cutoff after [`Self::contract_start`]
    pub fn first_cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    /// A date well before the standard contract start
    pub fn before_contract() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
    }

    /// A date during the first automatic extension year
    pub fn during_extension() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    /// Standard term: 1 month minimum, 3 months notice, 12 months extension
    pub fn standard_term() -> TermPolicy {
        TermPolicy::new(1, 3, 12)
    }

    /// Term without automatic extension
    pub fn non_extending_term() -> TermPolicy {
        TermPolicy::new(1, 3, 0)
    }

    /// Standard mandate signature date
    pub fn mandate_signed() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }
}

/// Fixture for tax test data
pub struct TaxFixtures;

impl TaxFixtures {
    /// German standard VAT
    pub fn standard_vat() -> Rate {
        Rate::from_percentage(dec!(19))
    }

    /// Reduced VAT for edge cases around mixed rates
    pub fn reduced_vat() -> Rate {
        Rate::from_percentage(dec!(7))
    }

    /// Zero rate for non-taxable scenarios
    pub fn zero_vat() -> Rate {
        Rate::from_percentage(dec!(0))
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic customer ID for testing
    pub fn customer_id() -> CustomerId {
        CustomerId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a deterministic booking account ID for testing
    pub fn booking_account_id() -> BookingAccountId {
        BookingAccountId::from_uuid(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap(),
        )
    }

    /// Creates a deterministic contract ID for testing
    pub fn contract_id() -> ContractId {
        ContractId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }
}

/// Fixture for CRM contact snapshots
pub struct CrmFixtures;

impl CrmFixtures {
    /// A complete contact record in the current field scheme
    pub fn contact_record() -> Value {
        json!({
            "company_name": "ACME GmbH",
            "street": "Hauptstrasse",
            "houseno": "12",
            "housenoadd": "a",
            "zip": "10115",
            "city": "Berlin",
            "country": "Deutschland",
            "tel": "030 1234",
            "ustid": "DE123456789",
            "email": "billing@acme.example",
        })
    }

    /// A complete contact record in the legacy field scheme
    pub fn legacy_contact_record() -> Value {
        json!({
            "firmierung": "Alt AG",
            "land": "Luxembourg",
            "strasse": "Rue Neuve",
            "hausnummer": "3",
            "zusatz": null,
            "plz": "L-1234",
            "ort": "Luxembourg",
            "telefon": "+352 1234",
            "ustid": "LU12345678",
            "email": "",
        })
    }

    /// A record too sparse to derive a provider contact from
    pub fn sparse_contact_record() -> Value {
        json!({
            "company_name": "Nameless",
            "street": "",
        })
    }
}
