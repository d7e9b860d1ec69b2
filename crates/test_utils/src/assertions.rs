//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_billing::Invoice;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than
/// the tolerance.
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={:?}, expected={:?}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that a Money value is a whole number of cents
pub fn assert_money_whole_cents(money: &Money) {
    assert!(
        money.is_whole_cents(),
        "Expected an amount rounded to cents, got {}",
        money.amount()
    );
}

/// Asserts that money values sum to a total
///
/// # Panics
///
/// Panics if the sum doesn't equal the total.
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(total.currency()), |acc, m| {
        acc.checked_add(m).expect("Currency mismatch in sum")
    });

    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts that an invoice's totals match its lines
///
/// The net total must be the sum of the line totals and the gross total
/// must be the net total grossed up with the invoice tax rate.
pub fn assert_invoice_totals_consistent(invoice: &Invoice) {
    let line_totals: Vec<Money> = invoice
        .items()
        .iter()
        .map(|item| item.price_total_net)
        .collect();
    assert_money_sum_equals(&line_totals, &invoice.total_net);

    assert_eq!(
        invoice.total_gross,
        invoice.tax_rate.gross_from_net(invoice.total_net),
        "Gross total doesn't match net total grossed up at {}%",
        invoice.tax_rate.as_percentage()
    );
    assert_money_whole_cents(&invoice.total_net);
    assert_money_whole_cents(&invoice.total_gross);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_approx_eq_within_tolerance() {
        let a = Money::new(dec!(100.00), Currency::EUR);
        let b = Money::new(dec!(100.01), Currency::EUR);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "differ by more than tolerance")]
    fn test_approx_eq_beyond_tolerance_panics() {
        let a = Money::new(dec!(100.00), Currency::EUR);
        let b = Money::new(dec!(100.10), Currency::EUR);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    fn test_sum_equals() {
        let parts = vec![
            Money::new(dec!(103.48), Currency::EUR),
            Money::new(dec!(49.00), Currency::EUR),
        ];
        let total = Money::new(dec!(152.48), Currency::EUR);
        assert_money_sum_equals(&parts, &total);
    }
}
