//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::NaiveDate;
use core_kernel::temporal::TermPolicy;
use core_kernel::{Currency, Money, Rate};
use domain_contracts::AccountingPeriod;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::EUR),
        Just(Currency::USD),
        Just(Currency::GBP),
        Just(Currency::CHF),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating valid Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating positive EUR prices
pub fn eur_price_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::EUR))
}

/// Strategy for generating tax rates between 0% and 30%
pub fn tax_rate_strategy() -> impl Strategy<Value = Rate> {
    (0u32..3000u32).prop_map(|n| Rate::from_percentage(Decimal::new(n as i64, 2)))
}

/// Strategy for generating calendar dates between 2020 and 2030
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030i32, 1u32..=12u32, 1u32..=28u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Strategy for generating first-of-month dates
pub fn month_start_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030i32, 1u32..=12u32)
        .prop_map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1).unwrap())
}

/// Strategy for generating valid accounting periods
pub fn accounting_period_strategy() -> impl Strategy<Value = AccountingPeriod> {
    prop_oneof![
        Just(AccountingPeriod::MONTHLY),
        Just(AccountingPeriod::QUARTERLY),
        Just(AccountingPeriod::BIANNUAL),
        Just(AccountingPeriod::YEARLY),
    ]
}

/// Strategy for generating term policies with realistic durations
pub fn term_policy_strategy() -> impl Strategy<Value = TermPolicy> {
    (1u32..=24u32, 1u32..=6u32, prop_oneof![Just(0u32), 1u32..=12u32, Just(12u32), Just(24u32)])
        .prop_map(|(minimum, notice, extension)| TermPolicy::new(minimum, notice, extension))
}
