//! Month-based proration
//!
//! Billing periods are expressed in months, and partial months are billed
//! as a fraction of the month they fall into. The end date is exclusive,
//! so a period covering all of January is (Jan 1, Feb 1) and yields
//! exactly 1.00.

use chrono::{Datelike, NaiveDate};
use core_kernel::temporal::{add_months, days_in_month, first_of_month, months_between};
use rust_decimal::{Decimal, RoundingStrategy};

fn round_fraction(numerator: u32, denominator: u32) -> Decimal {
    (Decimal::from(numerator) / Decimal::from(denominator))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Number of billable months between `start` and the exclusive `end`
///
/// A partial first month contributes the remaining fraction of that
/// month, a partial last month the elapsed fraction, each rounded to two
/// decimals. Whole months in between count 1.00 apiece, so the result
/// for a full-month period is exact.
pub fn billable_months(start: NaiveDate, end: NaiveDate) -> Decimal {
    let mut total = Decimal::ZERO;
    let mut start = start;
    let mut end = end;

    if start.day() != 1 {
        let month_days = days_in_month(start.year(), start.month());
        total += round_fraction(month_days - start.day(), month_days);
        start = add_months(first_of_month(start), 1);
    }

    if end.day() != 1 {
        total += round_fraction(end.day(), days_in_month(end.year(), end.month()));
        end = first_of_month(end);
    }

    total + Decimal::from(months_between(start, end))
}
