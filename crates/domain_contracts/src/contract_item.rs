//! Contract items
//!
//! Items are the billable positions of a contract. Their validity interval
//! is optional on both ends and falls back to the contract's interval,
//! so most items never carry own dates. Prices are net and must be whole
//! cents; `None` means "not billed", zero means "listed at zero".

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::{Actor, AuditStamp};
use core_kernel::identifiers::ContractItemId;
use core_kernel::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::Contract;
use crate::error::ContractError;

/// Lifecycle status shared by contracts and items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Not yet delivered, or delivery not yet documented
    InDelivery,
    Active,
    /// Active but billing is suspended
    Paused,
    Ended,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::InDelivery => "in delivery",
            ServiceStatus::Active => "active",
            ServiceStatus::Paused => "active, paused",
            ServiceStatus::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingType {
    /// One-off payment
    Once,
    /// Recurring payments
    Recurring,
}

/// Billing interval in months; must divide a year evenly
///
/// Only periods that fit completely into a year are supported, so the
/// accounting dates are the same in every year. Anything else would mess
/// up the next-bill calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AccountingPeriod(u8);

impl AccountingPeriod {
    pub const MONTHLY: AccountingPeriod = AccountingPeriod(1);
    pub const QUARTERLY: AccountingPeriod = AccountingPeriod(3);
    pub const BIANNUAL: AccountingPeriod = AccountingPeriod(6);
    pub const YEARLY: AccountingPeriod = AccountingPeriod(12);

    pub fn new(months: u8) -> Result<Self, ContractError> {
        if months > 0 && 12 % months == 0 {
            Ok(Self(months))
        } else {
            Err(ContractError::InvalidAccountingPeriod(months))
        }
    }

    pub fn months(&self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u8> for AccountingPeriod {
    type Error = ContractError;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<AccountingPeriod> for u8 {
    fn from(period: AccountingPeriod) -> u8 {
        period.0
    }
}

/// A billable position of a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractItem {
    pub id: ContractItemId,
    number: u32,
    /// Number of the owning contract
    pub contract: u32,
    /// Number of the item this one replaced
    pub predecessor: Option<u32>,
    /// Number of the item this one belongs under (e.g. a port on a rack)
    pub parent_item: Option<u32>,
    /// Display position within the contract
    pub order: u32,

    pub product_code: String,
    pub product_name: String,
    pub product_description: Option<String>,

    /// Own validity start; falls back to the contract's
    pub valid_from: Option<NaiveDate>,
    /// Own validity end; falls back to the contract's
    pub valid_till: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub minimum_duration_months: u32,
    pub notice_period_months: u32,

    pub order_reference: Option<String>,

    /// None means no recurring billing; zero means listed at zero
    pub price_recurring: Option<Money>,
    /// None means no setup fee; charged only on the first invoice
    pub price_setup: Option<Money>,
    pub accounting_period: AccountingPeriod,
    /// Next date this item becomes due for invoicing; None when billed out
    pub next_invoice: Option<NaiveDate>,
    /// Manual override of the next billing start, e.g. after credits
    pub last_invoice_override: Option<NaiveDate>,
    pub billing_type: BillingType,

    pub paused: bool,
    /// Old imported items are ignored by billing
    pub archived: bool,
    /// Link to the ready-for-service document
    pub ready_for_service: Option<String>,
    pub audit: AuditStamp,
}

impl ContractItem {
    pub fn new(
        number: u32,
        contract: u32,
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        accounting_period: AccountingPeriod,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContractItemId::new_v7(),
            number,
            contract,
            predecessor: None,
            parent_item: None,
            order: 0,
            product_code: product_code.into(),
            product_name: product_name.into(),
            product_description: None,
            valid_from: None,
            valid_till: None,
            termination_date: None,
            minimum_duration_months: 1,
            notice_period_months: 3,
            order_reference: None,
            price_recurring: None,
            price_setup: None,
            accounting_period,
            next_invoice: None,
            last_invoice_override: None,
            billing_type: BillingType::Recurring,
            paused: false,
            archived: false,
            ready_for_service: None,
            audit: AuditStamp::new(actor, now),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// Validity start after falling back to the contract
    pub fn effective_valid_from(&self, contract: &Contract) -> NaiveDate {
        self.valid_from.unwrap_or(contract.validity.from)
    }

    /// Validity end after falling back to the contract; None is open-ended
    pub fn effective_valid_till(&self, contract: &Contract) -> Option<NaiveDate> {
        self.valid_till.or(contract.validity.till)
    }

    /// Returns true if the item is valid on the given date
    ///
    /// An item with no own end date inherits the contract's; an item with
    /// an own end date keeps it even when the contract ends earlier.
    pub fn is_valid_on(&self, contract: &Contract, date: NaiveDate) -> bool {
        if self.effective_valid_from(contract) > date {
            return false;
        }
        match self.valid_till {
            Some(till) => till >= date,
            None => contract.validity.till.map_or(true, |till| till >= date),
        }
    }

    /// Derived item status
    ///
    /// ENDED begins the day after the effective `valid_till`.
    pub fn status(&self, contract: &Contract, today: NaiveDate) -> ServiceStatus {
        if self.ready_for_service.is_none() {
            return ServiceStatus::InDelivery;
        }
        if today < self.effective_valid_from(contract) {
            return ServiceStatus::InDelivery;
        }
        match self.effective_valid_till(contract) {
            None => {}
            Some(till) if today <= till => {}
            Some(_) => return ServiceStatus::Ended,
        }
        if self.paused {
            ServiceStatus::Paused
        } else {
            ServiceStatus::Active
        }
    }

    /// Cancels the item, terming it under the owning contract's rules
    ///
    /// Items carry no own extension period; the contract's term policy
    /// decides the earliest reachable end. Once the new end makes the
    /// pending invoice date moot, the date is cleared.
    pub fn cancel(
        &mut self,
        contract: &Contract,
        today: NaiveDate,
        date: Option<NaiveDate>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<NaiveDate, ContractError> {
        let new_till = match date {
            Some(requested) => {
                let earliest = contract.next_possible_end(today);
                if requested < earliest {
                    return Err(ContractError::CancelTooEarly {
                        earliest,
                        requested,
                    });
                }
                requested
            }
            None => {
                let mut till = contract.next_possible_end(today);
                if today > contract.next_cancelation_date(today)
                    && contract.term.automatic_extension_months > 0
                {
                    till = core_kernel::temporal::add_months(
                        till,
                        contract.term.automatic_extension_months as i32,
                    );
                }
                till
            }
        };
        self.termination_date = Some(today);
        self.valid_till = Some(new_till);
        if self.next_invoice.map_or(false, |next| next >= new_till) {
            self.next_invoice = None;
        }
        self.audit.touch(actor, now);
        Ok(new_till)
    }

    pub fn pause(&mut self, actor: Actor, now: DateTime<Utc>) {
        self.paused = true;
        self.audit.touch(actor, now);
    }

    pub fn unpause(&mut self, actor: Actor, now: DateTime<Utc>) {
        self.paused = false;
        self.audit.touch(actor, now);
    }

    /// Field-level validation against the owning contract
    pub fn validate(&self, contract: &Contract) -> Result<(), ContractError> {
        if let Some(from) = self.valid_from {
            if from < contract.validity.from {
                return Err(ContractError::validation_field(
                    "valid from date must be after the valid from date of the contract",
                    "valid_from",
                ));
            }
        }
        if let (Some(item_till), Some(contract_till)) = (self.valid_till, contract.validity.till) {
            if item_till > contract_till {
                return Err(ContractError::validation_field(
                    "valid till date of the contract must be after the item's valid till date",
                    "valid_till",
                ));
            }
        }
        if let (Some(from), Some(till)) = (self.valid_from, self.valid_till) {
            if from > till {
                return Err(ContractError::validation(
                    "valid from date must be before valid till",
                ));
            }
        }
        if let Some(price) = self.price_recurring {
            if !price.is_whole_cents() {
                return Err(ContractError::validation_field(
                    "only full cent prices are supported",
                    "price_recurring",
                ));
            }
        }
        if let Some(price) = self.price_setup {
            if !price.is_whole_cents() {
                return Err(ContractError::validation_field(
                    "only full cent prices are supported",
                    "price_setup",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::temporal::TermPolicy;
    use core_kernel::{BookingAccountId, Currency};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn contract() -> Contract {
        Contract::new(
            1,
            BookingAccountId::new(),
            "Test contract",
            d(2024, 1, 1),
            TermPolicy::new(1, 3, 12),
            Actor::System,
            Utc::now(),
        )
    }

    fn item() -> ContractItem {
        ContractItem::new(
            10,
            1,
            "COLO-1",
            "Colocation",
            AccountingPeriod::MONTHLY,
            Actor::System,
            Utc::now(),
        )
    }

    #[test]
    fn test_accounting_period_validation() {
        assert!(AccountingPeriod::new(1).is_ok());
        assert!(AccountingPeriod::new(3).is_ok());
        assert!(AccountingPeriod::new(6).is_ok());
        assert!(AccountingPeriod::new(12).is_ok());
        assert!(matches!(
            AccountingPeriod::new(5),
            Err(ContractError::InvalidAccountingPeriod(5))
        ));
        assert!(AccountingPeriod::new(0).is_err());
    }

    #[test]
    fn test_accounting_period_serde() {
        let period: AccountingPeriod = serde_json::from_str("3").unwrap();
        assert_eq!(period, AccountingPeriod::QUARTERLY);
        assert!(serde_json::from_str::<AccountingPeriod>("7").is_err());
        assert_eq!(serde_json::to_string(&period).unwrap(), "3");
    }

    #[test]
    fn test_effective_dates_fall_back_to_contract() {
        let c = contract();
        let mut i = item();
        assert_eq!(i.effective_valid_from(&c), d(2024, 1, 1));
        assert_eq!(i.effective_valid_till(&c), None);

        i.valid_from = Some(d(2024, 3, 1));
        i.valid_till = Some(d(2024, 9, 30));
        assert_eq!(i.effective_valid_from(&c), d(2024, 3, 1));
        assert_eq!(i.effective_valid_till(&c), Some(d(2024, 9, 30)));
    }

    #[test]
    fn test_status_ends_day_after_valid_till() {
        let c = contract();
        let mut i = item();
        i.ready_for_service = Some("https://docs.example/rfs/10".into());
        i.valid_till = Some(d(2024, 6, 30));

        assert_eq!(i.status(&c, d(2024, 6, 30)), ServiceStatus::Active);
        assert_eq!(i.status(&c, d(2024, 7, 1)), ServiceStatus::Ended);
    }

    #[test]
    fn test_status_paused_only_while_valid() {
        let c = contract();
        let mut i = item();
        i.ready_for_service = Some("https://docs.example/rfs/10".into());
        i.paused = true;

        assert_eq!(i.status(&c, d(2024, 6, 1)), ServiceStatus::Paused);

        i.valid_till = Some(d(2024, 5, 31));
        assert_eq!(i.status(&c, d(2024, 6, 1)), ServiceStatus::Ended);
    }

    #[test]
    fn test_cancel_clears_moot_next_invoice() {
        let c = contract();
        let mut i = item();
        i.next_invoice = Some(d(2026, 1, 1));

        // Earliest end as of 2024-06-01 is 2025-01-31, well before the
        // pending invoice date.
        let till = i
            .cancel(&c, d(2024, 6, 1), None, Actor::System, Utc::now())
            .unwrap();
        assert_eq!(till, d(2025, 1, 31));
        assert_eq!(i.next_invoice, None);
    }

    #[test]
    fn test_cancel_keeps_earlier_next_invoice() {
        let c = contract();
        let mut i = item();
        i.next_invoice = Some(d(2024, 7, 1));

        i.cancel(&c, d(2024, 6, 1), None, Actor::System, Utc::now())
            .unwrap();
        assert_eq!(i.next_invoice, Some(d(2024, 7, 1)));
    }

    #[test]
    fn test_validation_rejects_fractional_cents() {
        let c = contract();
        let mut i = item();
        i.price_recurring = Some(Money::new(dec!(9.999), Currency::EUR));
        assert!(i.validate(&c).is_err());

        i.price_recurring = Some(Money::new(dec!(9.99), Currency::EUR));
        assert!(i.validate(&c).is_ok());
    }

    #[test]
    fn test_validation_rejects_interval_outside_contract() {
        let mut c = contract();
        c.validity.till = Some(d(2024, 12, 31));
        let mut i = item();

        i.valid_from = Some(d(2023, 12, 1));
        assert!(i.validate(&c).is_err());

        i.valid_from = Some(d(2024, 2, 1));
        i.valid_till = Some(d(2025, 6, 30));
        assert!(i.validate(&c).is_err());

        i.valid_till = Some(d(2024, 6, 30));
        assert!(i.validate(&c).is_ok());
    }
}
