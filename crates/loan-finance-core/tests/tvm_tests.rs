use loan_finance_core::solvers::SolverConfig;
use loan_finance_core::tvm::{calculate_tvm, TvmInput, TvmKind};
use loan_finance_core::{CompoundingFrequency, LoanFinanceError, PaymentTiming};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn blank(kind: TvmKind) -> TvmInput {
    TvmInput {
        solve_for: kind,
        annual_rate_percent: None,
        years: None,
        present_value: None,
        payment: None,
        future_value: None,
        compounding: CompoundingFrequency::Annual,
        timing: PaymentTiming::End,
        solver: None,
    }
}

#[test]
fn test_future_value_daily_compounding() {
    let mut input = blank(TvmKind::FutureValue);
    input.annual_rate_percent = Some(dec!(5));
    input.years = Some(dec!(1));
    input.present_value = Some(dec!(-1000));
    input.compounding = CompoundingFrequency::Daily;

    let out = calculate_tvm(&input).unwrap().result;
    // 1000 * (1 + 0.05/365)^365 = 1051.27
    assert_eq!(out.value.round_dp(2), dec!(1051.27));
    assert_eq!(out.periods, dec!(365));
}

#[test]
fn test_present_value_of_annuity_due() {
    let mut input = blank(TvmKind::PresentValue);
    input.annual_rate_percent = Some(dec!(8));
    input.years = Some(dec!(10));
    input.payment = Some(dec!(-100));
    input.timing = PaymentTiming::Beginning;

    let out = calculate_tvm(&input).unwrap().result;
    // 671.01 * 1.08 = 724.69
    assert_eq!(out.value.round_dp(2), dec!(724.69));
}

#[test]
fn test_rate_single_sum_doubling() {
    let mut input = blank(TvmKind::Rate);
    input.years = Some(dec!(10));
    input.present_value = Some(dec!(-1000));
    input.future_value = Some(dec!(2000));

    let out = calculate_tvm(&input).unwrap().result;
    assert!(out.converged);
    assert!((out.value - dec!(7.177)).abs() < dec!(0.01));
}

#[test]
fn test_rate_unconverged_is_flagged() {
    let mut input = blank(TvmKind::Rate);
    input.years = Some(dec!(10));
    input.present_value = Some(dec!(-1000));
    input.future_value = Some(dec!(9000));
    input.solver = Some(SolverConfig {
        max_iterations: 1,
        ..SolverConfig::single_sum()
    });

    let result = calculate_tvm(&input).unwrap();
    assert!(!result.result.converged);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_rate_with_same_signed_cash_flows_is_flagged() {
    // Both flows positive: no rate solves pv·(1+r)^n + fv = 0
    let mut input = blank(TvmKind::Rate);
    input.years = Some(dec!(5));
    input.present_value = Some(dec!(1000));
    input.future_value = Some(dec!(1000));

    let result = calculate_tvm(&input).unwrap();
    assert!(!result.result.converged);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_periods_for_mortgage_payment() {
    let mut input = blank(TvmKind::Periods);
    input.annual_rate_percent = Some(dec!(6));
    input.present_value = Some(dec!(100000));
    input.payment = Some(dec!(-599.5505251));
    input.compounding = CompoundingFrequency::Monthly;

    let out = calculate_tvm(&input).unwrap().result;
    assert!((out.value - dec!(360)).abs() < dec!(0.001));
}

#[test]
fn test_periods_when_payment_too_small() {
    let mut input = blank(TvmKind::Periods);
    input.annual_rate_percent = Some(dec!(6));
    input.present_value = Some(dec!(100000));
    input.payment = Some(dec!(-400));
    input.compounding = CompoundingFrequency::Monthly;

    assert!(matches!(
        calculate_tvm(&input),
        Err(LoanFinanceError::DomainError(_))
    ));
}

#[test]
fn test_every_kind_dispatches() {
    for kind in [
        TvmKind::PresentValue,
        TvmKind::FutureValue,
        TvmKind::Payment,
        TvmKind::Rate,
        TvmKind::Periods,
    ] {
        let input = TvmInput {
            solve_for: kind,
            annual_rate_percent: Some(dec!(5)),
            years: Some(dec!(5)),
            present_value: Some(dec!(-1000)),
            payment: Some(dec!(-50)),
            future_value: Some(dec!(1600)),
            compounding: CompoundingFrequency::Annual,
            timing: PaymentTiming::End,
            solver: None,
        };
        let out = calculate_tvm(&input).unwrap().result;
        assert_eq!(out.kind, kind);
        assert!(!out.explanation.is_empty());
    }
}

#[test]
fn test_tvm_input_from_json() {
    let input: TvmInput = serde_json::from_str(
        r#"{"solve_for": "payment", "annual_rate_percent": "6", "years": "30",
            "present_value": "100000", "compounding": 12}"#,
    )
    .unwrap();
    assert_eq!(input.compounding, CompoundingFrequency::Monthly);
    assert_eq!(input.future_value, None);

    let out = calculate_tvm(&input).unwrap().result;
    assert!(out.value < Decimal::ZERO);
}
