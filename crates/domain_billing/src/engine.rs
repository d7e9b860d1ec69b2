//! Invoicing engine
//!
//! The daily run walks all due contract items, groups them into invoice
//! buckets, and drafts one invoice per bucket. Buckets are keyed by
//! booking account, billing period, and contract grouping; items of
//! collective contracts on the same account share one invoice, everything
//! else is invoiced per contract.
//!
//! Buckets are committed independently. A bucket that cannot be built is
//! counted and skipped; it never aborts the run.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use core_kernel::audit::Actor;
use core_kernel::identifiers::BookingAccountId;
use core_kernel::oplog::OperationalLog;
use core_kernel::temporal::{add_months, first_of_month};
use core_kernel::{Currency, Money};
use domain_contracts::{ContractDirectory, PaymentProfile};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::account::BookingAccount;
use crate::invoice::{Invoice, InvoiceItem};
use crate::proration::billable_months;

/// Grouping component of the bucket key
///
/// Items of collective contracts on one account share a bucket; others
/// are bucketed per contract number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CollectiveKey {
    Collective,
    Single(u32),
}

/// Outcome of one invoicing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicingReport {
    pub invoices_created: usize,
    pub positions_created: usize,
    pub email_deliveries: usize,
    pub post_deliveries: usize,
    pub sepa_invoices: usize,
    pub failed_buckets: usize,
    pub dry_run: bool,
}

/// Stored invoices plus the per-item billing history derived from them
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvoiceBook {
    invoices: Vec<Invoice>,
}

impl InvoiceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, invoice: Invoice) {
        self.invoices.push(invoice);
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoices_mut(&mut self) -> &mut [Invoice] {
        &mut self.invoices
    }

    /// True once any invoice line was billed against the item
    pub fn has_history(&self, item_number: u32) -> bool {
        self.invoices.iter().any(|invoice| {
            invoice
                .items()
                .iter()
                .any(|line| line.contract_item == Some(item_number))
        })
    }

    /// The billing end of the most recent invoice covering the item
    pub fn latest_billing_end(&self, item_number: u32) -> Option<NaiveDate> {
        self.invoices
            .iter()
            .filter(|invoice| {
                invoice
                    .items()
                    .iter()
                    .any(|line| line.contract_item == Some(item_number))
            })
            .max_by_key(|invoice| invoice.date)
            .map(|invoice| invoice.billing_end)
    }
}

/// First day of the next accounting interval after `as_of`
///
/// For monthly billing this is the first of the next month. Longer
/// intervals are anchored at month % interval == 1, i.e. quarters begin
/// in January, April, July, October. When the month after `as_of` is the
/// last month of an interval, the advance lands one full interval later;
/// items billed on schedule never start a period there.
pub fn next_interval_start(interval_months: u32, as_of: NaiveDate) -> NaiveDate {
    let mut ts = add_months(first_of_month(as_of), 1);
    if interval_months != 1 {
        let offset = ts.month() % interval_months;
        if offset != 1 {
            ts = add_months(ts, (interval_months - offset + 1) as i32);
        }
    }
    ts
}

struct BucketEntry {
    item: u32,
    billing_start: NaiveDate,
    billing_end: NaiveDate,
}

/// Drafts invoices for everything due as of the cutoff date
///
/// With `dry_run` set the full projection is computed and reported but
/// nothing is mutated.
#[allow(clippy::too_many_arguments)]
pub fn run_invoicing(
    directory: &mut ContractDirectory,
    accounts: &[BookingAccount],
    book: &mut InvoiceBook,
    as_of: NaiveDate,
    dry_run: bool,
    actor: Actor,
    now: DateTime<Utc>,
    oplog: &mut OperationalLog,
) -> InvoicingReport {
    if !dry_run {
        oplog.info(
            actor.clone(),
            "invoicing",
            format!("daily invoicing run starting, cutoff {as_of}"),
        );
    }

    // Step 1: select due items; items already billed once and carrying
    // no recurring price are done for good.
    let due: Vec<u32> = directory
        .due_items(as_of)
        .into_iter()
        .filter(|&number| {
            directory
                .item(number)
                .is_some_and(|item| item.price_recurring.is_some() || !book.has_history(number))
        })
        .collect();

    let mut report = InvoicingReport {
        invoices_created: 0,
        positions_created: 0,
        email_deliveries: 0,
        post_deliveries: 0,
        sepa_invoices: 0,
        failed_buckets: 0,
        dry_run,
    };

    // Step 2: compute each item's billing period and sort into buckets.
    let mut buckets: std::collections::BTreeMap<
        (Uuid, NaiveDate, NaiveDate, CollectiveKey),
        Vec<BucketEntry>,
    > = std::collections::BTreeMap::new();

    for number in due {
        let Some(item) = directory.item(number) else {
            continue;
        };
        let Some(contract) = directory.contract(item.contract) else {
            continue;
        };

        let billing_start = match item.last_invoice_override {
            Some(date) => date,
            None => match book.latest_billing_end(number) {
                Some(end) => end + Days::new(1),
                None => item.effective_valid_from(contract),
            },
        };
        let interval_end = next_interval_start(item.accounting_period.months(), as_of);
        let billing_end = match item.effective_valid_till(contract) {
            Some(end) if end < interval_end => end,
            _ => interval_end - Days::new(1),
        };

        let grouping = if contract.collective_invoice {
            CollectiveKey::Collective
        } else {
            CollectiveKey::Single(contract.number())
        };
        buckets
            .entry((
                Uuid::from(contract.booking_account),
                billing_start,
                billing_end,
                grouping,
            ))
            .or_default()
            .push(BucketEntry {
                item: number,
                billing_start,
                billing_end,
            });
    }

    // Step 3: one invoice per bucket, committed independently.
    for ((account_uuid, billing_start, billing_end, _), entries) in buckets {
        let account_id = BookingAccountId::from_uuid(account_uuid);
        let Some(account) = accounts.iter().find(|a| a.id == account_id) else {
            warn!(account = %account_id, "booking account missing, skipping bucket");
            report.failed_buckets += 1;
            if !dry_run {
                oplog.error(
                    actor.clone(),
                    "invoicing",
                    format!("no booking account {account_id} for bucket, skipped"),
                );
            }
            continue;
        };

        let (created, positions) = invoice_bucket(
            directory,
            book,
            account,
            &entries,
            billing_start,
            billing_end,
            as_of,
            dry_run,
            actor.clone(),
            now,
        );
        report.invoices_created += created;
        report.positions_created += positions;

        if account.invoice_delivery_email {
            report.email_deliveries += 1;
        }
        if account.invoice_delivery_post {
            report.post_deliveries += 1;
        }
        if account.pays_by_sepa() {
            report.sepa_invoices += 1;
        }
    }

    info!(
        invoices = report.invoices_created,
        positions = report.positions_created,
        dry_run, "invoicing run finished"
    );
    if !dry_run {
        oplog.info(
            actor,
            "invoicing",
            format!(
                "invoicing run finished, {} invoices with {} positions created",
                report.invoices_created, report.positions_created
            ),
        );
    }
    report
}

#[allow(clippy::too_many_arguments)]
fn invoice_bucket(
    directory: &mut ContractDirectory,
    book: &mut InvoiceBook,
    account: &BookingAccount,
    entries: &[BucketEntry],
    billing_start: NaiveDate,
    billing_end: NaiveDate,
    as_of: NaiveDate,
    dry_run: bool,
    actor: Actor,
    now: DateTime<Utc>,
) -> (usize, usize) {
    let next_invoice = billing_end + Days::new(1);

    // Items are advanced even when the bucket total ends up at zero;
    // a zero-total period is still a billed period.
    if !dry_run {
        for entry in entries {
            let effective_end = directory.item(entry.item).and_then(|item| {
                let contract = directory.contract(item.contract)?;
                item.effective_valid_till(contract)
            });
            if let Some(item) = directory.item_mut(entry.item) {
                item.next_invoice = match effective_end {
                    Some(end) if end < as_of => None,
                    _ => Some(next_invoice),
                };
                item.last_invoice_override = None;
                item.audit.touch(actor.clone(), now);
            }
        }
    }

    let mut lines: Vec<InvoiceItem> = Vec::new();
    for entry in entries {
        let Some(item) = directory.item(entry.item) else {
            continue;
        };
        if let Some(setup) = item.price_setup {
            if !book.has_history(entry.item) {
                let mut line = InvoiceItem::new(
                    Some(entry.item),
                    format!("{} - setup fee", item.product_name),
                    item.product_description.clone().unwrap_or_default(),
                    Decimal::ONE,
                    setup,
                    account.tax_rate,
                    entry.billing_start,
                    entry.billing_end,
                );
                line.is_recurring = false;
                lines.push(line);
            }
        }
        if let Some(price) = item.price_recurring {
            let amount = billable_months(entry.billing_start, entry.billing_end + Days::new(1));
            lines.push(InvoiceItem::new(
                Some(entry.item),
                item.product_name.clone(),
                item.product_description.clone().unwrap_or_default(),
                amount,
                price,
                account.tax_rate,
                entry.billing_start,
                entry.billing_end,
            ));
        }
    }

    let currency = lines
        .first()
        .map(|l| l.price_single_net.currency())
        .unwrap_or(Currency::EUR);
    let total_net = lines
        .iter()
        .fold(Money::zero(currency), |acc, l| acc + l.price_total_net);
    if !total_net.is_positive() {
        return (0, 0);
    }

    let position_count = lines.len();
    if !dry_run {
        let mut invoice = Invoice::new(
            account.id,
            as_of,
            billing_start,
            billing_end,
            account.tax_rate,
            currency,
            actor,
            now,
        );
        for line in lines {
            invoice.push_item(line);
        }
        book.push(invoice);
    }
    (1, position_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_interval_starts_next_month() {
        assert_eq!(next_interval_start(1, d(2024, 1, 15)), d(2024, 2, 1));
        assert_eq!(next_interval_start(1, d(2024, 12, 31)), d(2025, 1, 1));
    }

    #[test]
    fn test_quarterly_intervals_are_anchored_to_january() {
        // Quarters start in January, April, July, October.
        assert_eq!(next_interval_start(3, d(2024, 1, 15)), d(2024, 4, 1));
        assert_eq!(next_interval_start(3, d(2024, 3, 15)), d(2024, 4, 1));
        assert_eq!(next_interval_start(3, d(2024, 12, 15)), d(2025, 1, 1));
    }

    #[test]
    fn test_interval_end_month_advances_a_full_interval() {
        // A cutoff right before the last month of a quarter lands one
        // quarter later, not at the immediately following boundary.
        assert_eq!(next_interval_start(3, d(2024, 2, 15)), d(2024, 7, 1));
        assert_eq!(next_interval_start(3, d(2024, 11, 15)), d(2025, 4, 1));
    }

    #[test]
    fn test_yearly_interval() {
        assert_eq!(next_interval_start(12, d(2024, 5, 10)), d(2025, 1, 1));
    }

    #[test]
    fn test_biannual_interval() {
        assert_eq!(next_interval_start(6, d(2024, 2, 10)), d(2024, 7, 1));
        assert_eq!(next_interval_start(6, d(2024, 8, 10)), d(2025, 1, 1));
    }
}
