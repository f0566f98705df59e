use loan_finance_core::solvers::{solve_rate_for_payment, solve_rate_newton, SolverConfig};
use loan_finance_core::time_value::{
    annuity_future_value, annuity_present_value, loan_amount_from_payment, loan_term_from_payment,
    monthly_payment, periodic_rate,
};
use loan_finance_core::{LoanFinanceError, PaymentTiming};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Monthly payment
// ===========================================================================

#[test]
fn test_monthly_payment_reference_mortgage() {
    // 100000 at 6% over 30 years: 599.55 per month
    let payment = monthly_payment(dec!(100000), dec!(6), dec!(30)).unwrap();
    assert_eq!(payment.round_dp(2), dec!(599.55));
}

#[test]
fn test_monthly_payment_zero_rate_exact() {
    let payment = monthly_payment(dec!(12000), Decimal::ZERO, dec!(1)).unwrap();
    assert_eq!(payment, dec!(1000));
}

#[test]
fn test_monthly_payment_negative_rate_rejected() {
    assert!(matches!(
        monthly_payment(dec!(12000), dec!(-1), dec!(1)),
        Err(LoanFinanceError::InvalidInput { .. })
    ));
}

#[test]
fn test_monthly_payment_zero_term_rejected() {
    assert!(matches!(
        monthly_payment(dec!(12000), dec!(5), Decimal::ZERO),
        Err(LoanFinanceError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Annuities
// ===========================================================================

#[test]
fn test_annuity_future_value_ordinary_and_due() {
    // 100 a year for 5 years at 5%: FV = 100 * (1.05^5 - 1) / 0.05 = 552.56
    let ordinary = annuity_future_value(dec!(100), dec!(0.05), dec!(5), PaymentTiming::End).unwrap();
    assert!((ordinary - dec!(552.56)).abs() < dec!(0.01));

    let due = annuity_future_value(dec!(100), dec!(0.05), dec!(5), PaymentTiming::Beginning).unwrap();
    assert!((due - dec!(580.19)).abs() < dec!(0.01));
}

#[test]
fn test_annuity_zero_rate_is_sum_of_payments() {
    let pv = annuity_present_value(dec!(250), Decimal::ZERO, dec!(8), PaymentTiming::Beginning).unwrap();
    assert_eq!(pv, dec!(2000));
}

#[test]
fn test_loan_amount_zero_rate() {
    let amount = loan_amount_from_payment(dec!(500), Decimal::ZERO, dec!(24)).unwrap();
    assert_eq!(amount, dec!(12000));
}

// ===========================================================================
// Loan term
// ===========================================================================

#[test]
fn test_loan_term_recovers_thirty_years() {
    let rate = periodic_rate(dec!(6), 12);
    let payment = monthly_payment(dec!(100000), dec!(6), dec!(30)).unwrap();
    let n = loan_term_from_payment(dec!(100000), payment, rate).unwrap();
    assert!((n - dec!(360)).abs() < dec!(0.0001));
}

#[test]
fn test_loan_term_payment_below_interest_is_domain_error() {
    let rate = periodic_rate(dec!(6), 12);
    let result = loan_term_from_payment(dec!(100000), dec!(499.99), rate);
    assert!(matches!(result, Err(LoanFinanceError::DomainError(_))));
}

// ===========================================================================
// Solvers
// ===========================================================================

#[test]
fn test_solve_rate_newton_no_growth() {
    let outcome = solve_rate_newton(dec!(1000), dec!(1000), dec!(10), &SolverConfig::single_sum()).unwrap();
    assert!(outcome.converged);
    assert!(outcome.value.abs() < dec!(0.0001));
}

#[test]
fn test_solve_rate_for_payment_recovers_car_loan_rate() {
    // 25000 over 60 months at 7.2%
    let payment = monthly_payment(dec!(25000), dec!(7.2), dec!(5)).unwrap();
    let outcome = solve_rate_for_payment(dec!(25000), payment, dec!(60), &SolverConfig::annuity()).unwrap();
    assert!(outcome.converged);
    assert!((outcome.value - dec!(0.006)).abs() < dec!(0.000001));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_total_paid_covers_principal(
        cents in 100_000i64..100_000_000i64,
        basis_points in 0i64..2_000i64,
        years in 1u32..=40,
    ) {
        let principal = Decimal::new(cents, 2);
        let rate = Decimal::new(basis_points, 2);
        let years = Decimal::from(years);

        let payment = monthly_payment(principal, rate, years).unwrap();
        let total = payment * years * dec!(12);

        if rate.is_zero() {
            prop_assert!((total - principal).abs() < dec!(0.0000001));
        } else {
            prop_assert!(total >= principal);
        }
    }

    #[test]
    fn prop_loan_amount_inverts_payment(
        cents in 100_000i64..100_000_000i64,
        basis_points in 1i64..2_000i64,
        years in 1u32..=40,
    ) {
        let principal = Decimal::new(cents, 2);
        let rate_percent = Decimal::new(basis_points, 2);
        let years = Decimal::from(years);

        let payment = monthly_payment(principal, rate_percent, years).unwrap();
        let recovered = loan_amount_from_payment(payment, periodic_rate(rate_percent, 12), years * dec!(12)).unwrap();

        prop_assert!(((recovered - principal) / principal).abs() < dec!(0.000001));
    }
}
