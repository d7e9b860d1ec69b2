//! Contract aggregate
//!
//! A contract groups billable items for one booking account. Its validity
//! interval uses whole days with an inclusive end: a contract whose
//! `valid_till` equals today is still active today, and ENDED begins the
//! following day.
//!
//! Term handling follows the business rules for minimum duration, notice
//! period, and automatic extension. The earliest reachable end date is a
//! function of today, because every missed cancelation deadline pushes the
//! end out by one extension period.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::{Actor, AuditStamp};
use core_kernel::identifiers::{BookingAccountId, ContractId};
use core_kernel::temporal::{add_months, DateInterval, TermPolicy};
use serde::{Deserialize, Serialize};

use crate::contract_item::ServiceStatus;
use crate::error::ContractError;

/// Payment capabilities of the booking account a contract bills against
///
/// Contracts cannot see billing aggregates directly; the account hands in
/// its capabilities through this trait when a contract is validated.
pub trait PaymentProfile {
    /// True when the account settles invoices by SEPA direct debit
    fn pays_by_sepa(&self) -> bool;

    /// True when a valid, unrevoked SEPA mandate is on file
    fn sepa_ready(&self) -> bool;
}

/// A contract over one or more billable items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    number: u32,
    pub booking_account: BookingAccountId,
    pub name: String,
    pub order_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub validity: DateInterval,
    pub term: TermPolicy,
    /// Items of collective contracts on one account are billed together
    pub collective_invoice: bool,
    pub order_reference: Option<String>,
    /// Link to the ready-for-service document; unset means still in delivery
    pub ready_for_service: Option<String>,
    pub comment: Option<String>,
    pub audit: AuditStamp,
}

impl Contract {
    pub fn new(
        number: u32,
        booking_account: BookingAccountId,
        name: impl Into<String>,
        valid_from: NaiveDate,
        term: TermPolicy,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContractId::new_v7(),
            number,
            booking_account,
            name: name.into(),
            order_date: None,
            termination_date: None,
            validity: DateInterval::open(valid_from),
            term,
            collective_invoice: true,
            order_reference: None,
            ready_for_service: None,
            comment: None,
            audit: AuditStamp::new(actor, now),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// Returns true if the contract is valid on the given date
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.validity.contains(date)
    }

    /// The earliest end date still reachable as of `today`
    pub fn next_possible_end(&self, today: NaiveDate) -> NaiveDate {
        self.term.next_possible_end(self.validity.from, today)
    }

    /// The last day a cancelation can arrive and still hit
    /// [`Contract::next_possible_end`]
    pub fn next_cancelation_date(&self, today: NaiveDate) -> NaiveDate {
        self.term.next_cancelation_date(self.validity.from, today)
    }

    pub fn is_terminated(&self) -> bool {
        self.termination_date.is_some()
    }

    /// Derived contract status
    ///
    /// Without a ready-for-service document the contract is still in
    /// delivery regardless of dates. A set `valid_till` on or after today
    /// means active; the day after `valid_till` it flips to ended.
    pub fn status(&self, today: NaiveDate) -> ServiceStatus {
        if self.ready_for_service.is_none() {
            return ServiceStatus::InDelivery;
        }
        match self.validity.till {
            Some(till) if till >= today => ServiceStatus::Active,
            Some(_) => ServiceStatus::Ended,
            None => {
                if self.validity.from > today {
                    ServiceStatus::InDelivery
                } else {
                    ServiceStatus::Active
                }
            }
        }
    }

    /// Cancels the contract and returns the resulting end date
    ///
    /// With an explicit date, the date must not precede the earliest
    /// reachable end. Without one, the contract ends at the earliest
    /// reachable end; if today is already past the cancelation deadline
    /// for that end, one more extension period applies.
    pub fn cancel(
        &mut self,
        today: NaiveDate,
        date: Option<NaiveDate>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<NaiveDate, ContractError> {
        let new_till = match date {
            Some(requested) => {
                let earliest = self.next_possible_end(today);
                if requested < earliest {
                    return Err(ContractError::CancelTooEarly {
                        earliest,
                        requested,
                    });
                }
                requested
            }
            None => {
                let mut till = self.next_possible_end(today);
                if today > self.next_cancelation_date(today)
                    && self.term.automatic_extension_months > 0
                {
                    till = add_months(till, self.term.automatic_extension_months as i32);
                }
                till
            }
        };
        self.termination_date = Some(today);
        self.validity.till = Some(new_till);
        self.audit.touch(actor, now);
        Ok(new_till)
    }

    /// Validates the contract against its account's payment capabilities
    ///
    /// A running contract (no end, or an end after today) on a SEPA
    /// account requires a valid mandate.
    pub fn validate(
        &self,
        payment: &impl PaymentProfile,
        today: NaiveDate,
    ) -> Result<(), ContractError> {
        let running = match self.validity.till {
            None => true,
            Some(till) => till > today,
        };
        if payment.pays_by_sepa() && running && !payment.sepa_ready() {
            return Err(ContractError::validation(
                "customer SEPA information requirements are not met, cannot enable SEPA for this contract",
            ));
        }
        Ok(())
    }
}
