//! Booking accounts and SEPA mandates
//!
//! A booking account is the billing address and payment setup a customer
//! settles invoices under. Named like this because plain "account" is too
//! ambiguous. Each account mirrors a contact record into the invoicing
//! provider; the sync bookkeeping lives in [`SyncInfo`].

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::{Actor, AuditStamp};
use core_kernel::identifiers::{BookingAccountId, MandateId};
use core_kernel::ports::{SyncInfo, Syncable};
use core_kernel::Rate;
use domain_contracts::PaymentProfile;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How an account settles its invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// SEPA direct debit
    Sepa,
    /// Payment on invoice
    Invoice,
    /// No data, historic import
    None,
}

/// Document format the provider renders invoices in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceFormat {
    #[serde(rename = "zugferd2_2")]
    Zugferd,
    #[serde(rename = "xrechnung3_0_xml")]
    XRechnung,
}

/// Tax treatment, following the provider's document API codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxOption {
    /// Normally taxable
    #[serde(rename = "NULL")]
    Standard,
    /// Not taxable, third country
    #[serde(rename = "nStb")]
    NonTaxableThirdCountry,
    /// Reverse charge, domestic
    #[serde(rename = "revc")]
    ReverseCharge,
    /// Intra-community supply
    #[serde(rename = "IG")]
    IntraCommunitySupply,
    /// Export delivery
    #[serde(rename = "AL")]
    ExportDelivery,
    /// Small business, no VAT
    #[serde(rename = "smallBusiness")]
    SmallBusiness,
}

/// A SEPA direct debit mandate on file for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SepaMandate {
    pub id: MandateId,
    pub account_owner: String,
    pub bank_name: String,
    pub bic: String,
    pub iban: String,
    /// Mandate reference printed on the debit
    pub reference: String,
    pub address_street: String,
    pub address_zip_code: String,
    pub address_city: String,
    pub address_country: String,
    /// Date the customer signed the mandate
    pub signed: Option<NaiveDate>,
    pub revoked: Option<DateTime<Utc>>,
    pub first_used: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
}

impl SepaMandate {
    pub fn new(
        account_owner: impl Into<String>,
        bank_name: impl Into<String>,
        bic: impl Into<String>,
        iban: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: MandateId::new_v7(),
            account_owner: account_owner.into(),
            bank_name: bank_name.into(),
            bic: bic.into(),
            iban: iban.into(),
            reference: reference.into(),
            address_street: String::new(),
            address_zip_code: String::new(),
            address_city: String::new(),
            address_country: "DE".to_string(),
            signed: None,
            revoked: None,
            first_used: None,
            last_used: None,
        }
    }

    /// All identifying fields present and the mandate not revoked
    pub fn is_valid(&self) -> bool {
        !self.account_owner.is_empty()
            && !self.bank_name.is_empty()
            && !self.bic.is_empty()
            && !self.iban.is_empty()
            && !self.reference.is_empty()
            && !self.address_street.is_empty()
            && !self.address_zip_code.is_empty()
            && !self.address_city.is_empty()
            && self.revoked.is_none()
    }

    /// FRST until the first debit went through, RCUR afterwards
    pub fn sequence_type(&self) -> &'static str {
        if self.first_used.is_none() && self.last_used.is_none() {
            "FRST"
        } else {
            "RCUR"
        }
    }

    /// Records a debit; the first one sets both timestamps
    pub fn record_debit(&mut self, now: DateTime<Utc>) {
        self.first_used = self.first_used.or(Some(now));
        self.last_used = Some(now);
    }

    /// Debit instructions for the invoicing provider
    ///
    /// None until the mandate is signed; the provider rejects debits
    /// without a signature date.
    pub fn debit_instructions(&self) -> Option<Value> {
        let signed = self.signed?;
        Some(json!({
            "debitor_bic": self.bic,
            "debitor_iban": self.iban,
            "debitor_name": self.account_owner,
            "debitor_address_line_1": self.address_street,
            "debitor_address_line_2": format!("{} {}", self.address_zip_code, self.address_city),
            "debitor_country": self.address_country,
            "local_instrument": "CORE",
            "mandate_date_of_signature": signed,
            "mandate_id": self.reference,
            "sequence_type": self.sequence_type(),
        }))
    }
}

/// Billing address and payment setup for one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingAccount {
    pub id: BookingAccountId,
    /// Number of the owning customer
    pub customer: u32,
    pub payment_method: PaymentMethod,
    pub invoice_format: InvoiceFormat,
    pub invoice_delivery_email: bool,
    pub invoice_delivery_post: bool,
    /// Payment term in days
    pub payment_term_days: u32,
    pub tax_rate: Rate,
    pub tax_option: TaxOption,
    /// Buyer reference required on XRechnung documents
    pub xrechnung_buyer_reference: Option<String>,

    /// Comma-separated list of billing mail recipients
    pub address_email: Option<String>,
    pub address_name: Option<String>,
    pub address_company: Option<String>,
    pub address_street: Option<String>,
    pub address_suffix: Option<String>,
    pub address_city: Option<String>,
    pub address_zip_code: Option<String>,
    pub address_country: Option<String>,

    pub comment: Option<String>,
    pub sepa: Option<SepaMandate>,
    pub sync: SyncInfo,
    pub audit: AuditStamp,
}

impl BookingAccount {
    pub fn new(customer: u32, actor: Actor, now: DateTime<Utc>) -> Self {
        Self {
            id: BookingAccountId::new_v7(),
            customer,
            payment_method: PaymentMethod::Invoice,
            invoice_format: InvoiceFormat::Zugferd,
            invoice_delivery_email: false,
            invoice_delivery_post: false,
            payment_term_days: 14,
            tax_rate: Rate::default(),
            tax_option: TaxOption::Standard,
            xrechnung_buyer_reference: None,
            address_email: None,
            address_name: None,
            address_company: None,
            address_street: None,
            address_suffix: None,
            address_city: None,
            address_zip_code: None,
            address_country: None,
            comment: None,
            sepa: None,
            sync: SyncInfo::default(),
            audit: AuditStamp::new(actor, now),
        }
    }

    /// Recipients of invoice mails, split from the stored list
    pub fn billing_emails(&self) -> Vec<String> {
        self.address_email
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Contact record for the invoicing provider
    ///
    /// None while the street is missing; the provider rejects contacts
    /// without one, so an empty record is never pushed.
    pub fn provider_payload(&self) -> Option<Value> {
        self.address_street.as_deref()?;

        let (first_name, last_name) = match self.address_name.as_deref() {
            Some(name) => match name.split_once(' ') {
                Some((first, last)) => (Some(first.to_string()), Some(last.to_string())),
                None => (Some(String::new()), Some(name.to_string())),
            },
            None => (None, None),
        };

        Some(json!({
            "first_name": first_name,
            "last_name": last_name,
            "suffix_1": self.address_suffix,
            "street": self.address_street,
            "city": self.address_city,
            "company_name": self.address_company,
            "zip_code": self.address_zip_code,
            "country": self.address_country.as_deref().unwrap_or("DE"),
            "emails": self.billing_emails(),
            "note": self.id.to_string(),
            "personal": false,
            "salutation": 0,
        }))
    }
}

impl PaymentProfile for BookingAccount {
    fn pays_by_sepa(&self) -> bool {
        self.payment_method == PaymentMethod::Sepa
    }

    fn sepa_ready(&self) -> bool {
        self.sepa.as_ref().is_some_and(SepaMandate::is_valid)
    }
}

impl Syncable for BookingAccount {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn mandate() -> SepaMandate {
        let mut m = SepaMandate::new(
            "ACME GmbH",
            "Sparkasse Berlin",
            "BELADEBEXXX",
            "DE02120300000000202051",
            "GW-1001",
        );
        m.address_street = "Hauptstrasse 12".into();
        m.address_zip_code = "10115".into();
        m.address_city = "Berlin".into();
        m.signed = Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        m
    }

    fn account() -> BookingAccount {
        let mut a = BookingAccount::new(1001, Actor::System, Utc::now());
        a.address_company = Some("ACME GmbH".into());
        a.address_street = Some("Hauptstrasse 12".into());
        a.address_zip_code = Some("10115".into());
        a.address_city = Some("Berlin".into());
        a.address_email = Some("billing@acme.example, cfo@acme.example".into());
        a
    }

    #[test]
    fn test_mandate_sequence_type_flips_after_first_debit() {
        let mut m = mandate();
        assert_eq!(m.sequence_type(), "FRST");

        let first = Utc::now();
        m.record_debit(first);
        assert_eq!(m.sequence_type(), "RCUR");
        assert_eq!(m.first_used, Some(first));

        let second = Utc::now();
        m.record_debit(second);
        assert_eq!(m.first_used, Some(first));
        assert_eq!(m.last_used, Some(second));
    }

    #[test]
    fn test_mandate_validity() {
        let mut m = mandate();
        assert!(m.is_valid());

        m.revoked = Some(Utc::now());
        assert!(!m.is_valid());

        let mut incomplete = mandate();
        incomplete.iban = String::new();
        assert!(!incomplete.is_valid());
    }

    #[test]
    fn test_debit_instructions_require_signature() {
        let mut m = mandate();
        m.signed = None;
        assert!(m.debit_instructions().is_none());

        m.signed = Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let data = m.debit_instructions().unwrap();
        assert_eq!(data["sequence_type"], "FRST");
        assert_eq!(data["local_instrument"], "CORE");
        assert_eq!(data["debitor_address_line_2"], "10115 Berlin");
    }

    #[test]
    fn test_sepa_ready_needs_valid_mandate() {
        let mut a = account();
        a.payment_method = PaymentMethod::Sepa;
        assert!(a.pays_by_sepa());
        assert!(!a.sepa_ready());

        a.sepa = Some(mandate());
        assert!(a.sepa_ready());

        if let Some(m) = a.sepa.as_mut() {
            m.revoked = Some(Utc::now());
        }
        assert!(!a.sepa_ready());
    }

    #[test]
    fn test_provider_payload_needs_a_street() {
        let mut a = account();
        a.address_street = None;
        assert!(a.provider_payload().is_none());
    }

    #[test]
    fn test_provider_payload_splits_personal_names() {
        let mut a = account();
        a.address_name = Some("Erika Musterfrau".into());
        let payload = a.provider_payload().unwrap();
        assert_eq!(payload["first_name"], "Erika");
        assert_eq!(payload["last_name"], "Musterfrau");
        assert_eq!(
            payload["emails"],
            json!(["billing@acme.example", "cfo@acme.example"])
        );

        a.address_name = Some("Mononym".into());
        let payload = a.provider_payload().unwrap();
        assert_eq!(payload["first_name"], "");
        assert_eq!(payload["last_name"], "Mononym");
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Sepa).unwrap(),
            "\"SEPA\""
        );
        assert_eq!(
            serde_json::to_string(&InvoiceFormat::Zugferd).unwrap(),
            "\"zugferd2_2\""
        );
        assert_eq!(
            serde_json::to_string(&TaxOption::Standard).unwrap(),
            "\"NULL\""
        );
    }
}
