//! Invoices and invoice lines
//!
//! Invoices are drafted locally and stay without a number until the
//! invoicing provider finalizes them; the provider owns the numbering.
//! Line amounts are fractional month counts with three decimal places,
//! so a line reads "0.52 x 199.00".
//!
//! Totals are recomputed every time a line is pushed; `total_net` equals
//! the sum of the line totals at all times.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::{Actor, AuditStamp};
use core_kernel::identifiers::{BookingAccountId, InvoiceId, InvoiceItemId};
use core_kernel::ports::{SyncInfo, Syncable};
use core_kernel::{Money, Rate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One line on an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    /// Number of the billed contract item; None for imported lines
    pub contract_item: Option<u32>,
    /// Display position on the document
    pub order: u32,
    pub name: Option<String>,
    pub description: String,
    /// Billed quantity in (possibly fractional) months, three decimals
    pub amount: Decimal,
    pub price_single_net: Money,
    /// single price x amount, rounded to cents
    pub price_total_net: Money,
    pub tax_rate: Rate,
    /// False for setup lines on an otherwise recurring item
    pub is_recurring: bool,
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
}

impl InvoiceItem {
    pub fn new(
        contract_item: Option<u32>,
        name: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        price_single_net: Money,
        tax_rate: Rate,
        billing_start: NaiveDate,
        billing_end: NaiveDate,
    ) -> Self {
        let amount = amount.round_dp(3);
        Self {
            id: InvoiceItemId::new_v7(),
            contract_item,
            order: 0,
            name: Some(name.into()),
            description: description.into(),
            amount,
            price_single_net,
            price_total_net: price_single_net.multiply(amount).round_bankers(2),
            tax_rate,
            is_recurring: true,
            billing_start,
            billing_end,
        }
    }

    pub fn price_single_gross(&self) -> Money {
        self.tax_rate.gross_from_net(self.price_single_net)
    }

    pub fn price_total_gross(&self) -> Money {
        self.tax_rate.gross_from_net(self.price_total_net)
    }
}

/// SEPA sequence recorded on the invoice once a debit was filed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SepaSequence {
    #[serde(rename = "FRST")]
    First,
    #[serde(rename = "RCUR")]
    Recurring,
}

/// A locally drafted invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Assigned by the provider on finalization
    pub number: Option<u32>,
    pub booking_account: BookingAccountId,
    pub date: NaiveDate,
    /// Kept in sync with the lines for convenient access
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
    items: Vec<InvoiceItem>,
    pub total_net: Money,
    pub total_gross: Money,
    pub tax_rate: Rate,
    /// False blocks pushes to the provider until resolved
    pub approved: bool,
    pub canceled: bool,
    /// Storage path of the rendered document, once fetched
    pub document: Option<String>,
    pub sepa_transaction_type: Option<SepaSequence>,
    pub sync: SyncInfo,
    pub audit: AuditStamp,
}

impl Invoice {
    pub fn new(
        booking_account: BookingAccountId,
        date: NaiveDate,
        billing_start: NaiveDate,
        billing_end: NaiveDate,
        tax_rate: Rate,
        currency: core_kernel::Currency,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InvoiceId::new_v7(),
            number: None,
            booking_account,
            date,
            billing_start,
            billing_end,
            items: Vec::new(),
            total_net: Money::zero(currency),
            total_gross: Money::zero(currency),
            tax_rate,
            approved: true,
            canceled: false,
            document: None,
            sepa_transaction_type: None,
            sync: SyncInfo::default(),
            audit: AuditStamp::new(actor, now),
        }
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    /// Appends a line and recomputes the totals
    ///
    /// Lines inherit the invoice's tax rate; per-line rates would break
    /// the gross computation on the document.
    pub fn push_item(&mut self, mut item: InvoiceItem) {
        item.order = self.items.len() as u32;
        item.tax_rate = self.tax_rate;
        self.items.push(item);
        self.update_totals();
    }

    fn update_totals(&mut self) {
        let currency = self.total_net.currency();
        self.total_net = self
            .items
            .iter()
            .fold(Money::zero(currency), |acc, item| acc + item.price_total_net);
        self.total_gross = self.tax_rate.gross_from_net(self.total_net);
    }

    /// Document data for the invoicing provider
    ///
    /// Contact and customer identifiers are filled in by the gateway,
    /// which knows the provider-side ids.
    pub fn provider_payload(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|line| {
                let description = match line.name.as_deref() {
                    Some(name) => format!("{name}: {}", line.description),
                    None => line.description.clone(),
                };
                json!({
                    "description": description,
                    "item_type": "PRODUCT",
                    "type": "POSITION",
                    "quantity": line.amount,
                    "single_price_net": line.price_single_net.minor_units(),
                    "single_price_gross": line.price_single_gross().minor_units(),
                    "vat_percent": line.tax_rate.as_percentage(),
                })
            })
            .collect();
        json!({
            "document_date": self.date,
            "service_date": {
                "type": "SERVICE",
                "date_from": self.billing_start,
                "date_to": self.billing_end,
            },
            "pdf_template": "DE",
            "type": "INVOICE",
            "items": items,
        })
    }
}

impl Syncable for Invoice {
    fn sync_info(&self) -> &SyncInfo {
        &self.sync
    }

    fn sync_info_mut(&mut self) -> &mut SyncInfo {
        &mut self.sync
    }

    fn sync_payload(&self) -> Value {
        self.provider_payload()
    }
}
