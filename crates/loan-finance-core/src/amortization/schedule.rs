use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::yearly::{yearly_totals, YearlyTotals};
use crate::error::LoanFinanceError;
use crate::time_value::amortizing_payment;
use crate::types::*;
use crate::LoanFinanceResult;

/// Balance at or below which the loan counts as repaid.
const BALANCE_TOLERANCE: Money = dec!(0.01);

/// Input for an amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    /// Nominal annual rate as a percentage (6 means 6%)
    pub annual_rate_percent: Decimal,
    pub term_years: Decimal,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    /// Additional principal paid with every scheduled payment
    #[serde(default)]
    pub extra_payment: Money,
    /// Loan start; the first payment falls one period later
    pub start_date: NaiveDate,
    /// Fixed periodic payment to use instead of the fully amortizing one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_override: Option<Money>,
}

/// One row of the schedule.
///
/// Any extra payment is included in `principal_portion`, so
/// `gross_payment == principal_portion + interest_portion` on every row;
/// `extra_payment` shows how much of the principal came from the extra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub date: NaiveDate,
    pub gross_payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub extra_payment: Money,
    pub remaining_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// Aggregates over a generated schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub payments_made: u32,
    /// Number of periods in the contractual term
    pub scheduled_periods: u32,
    /// Regular payment before any extra
    pub periodic_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra: Money,
    /// Periods cut from the term by paying early
    pub periods_saved: u32,
    /// Interest avoided relative to the level payment with no extras
    pub interest_saved: Money,
    pub payoff_date: NaiveDate,
    pub fully_amortized: bool,
    pub remaining_balance: Money,
}

/// Output of the amortization generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub schedule: Vec<ScheduledPayment>,
    pub summary: ScheduleSummary,
    pub yearly: Vec<YearlyTotals>,
}

impl AmortizationOutput {
    /// Fail if the term ran out before the balance reached zero.
    pub fn require_paid_off(&self) -> LoanFinanceResult<()> {
        if self.summary.fully_amortized {
            Ok(())
        } else {
            Err(LoanFinanceError::ScheduleOverrun {
                periods: self.summary.payments_made,
                remaining_balance: self.summary.remaining_balance,
            })
        }
    }
}

/// Build the full payment-by-payment schedule and its summary.
pub fn generate_schedule(
    input: &AmortizationInput,
) -> LoanFinanceResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let params = LoanParameters::new(input.principal, input.annual_rate_percent, input.term_years);
    let periods_per_year = input.payment_frequency.periods_per_year();
    let months_per_period = input.payment_frequency.months_per_period();
    let rate = params.periodic_rate(periods_per_year);
    let total_periods = params.total_periods(periods_per_year)?;

    let level_payment = amortizing_payment(input.principal, rate, Decimal::from(total_periods))?;
    let base_payment = input.payment_override.unwrap_or(level_payment);

    let first_interest = input.principal * rate;
    if base_payment <= first_interest {
        warnings.push(format!(
            "Payment of {base_payment} does not cover first-period interest of {first_interest}; \
             the balance will not decline"
        ));
    }

    let mut schedule = Vec::with_capacity(total_periods as usize);
    let mut balance = input.principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;
    let mut period: u32 = 0;

    while balance > Decimal::ZERO && period < total_periods {
        period += 1;

        let interest = balance * rate;
        let scheduled_principal = (base_payment - interest).min(balance);
        let extra = input
            .extra_payment
            .min(balance - scheduled_principal)
            .max(Decimal::ZERO);

        let mut principal_portion = scheduled_principal + extra;
        let mut remaining = balance - principal_portion;

        // Fold sub-cent residue into the final payment
        if remaining <= BALANCE_TOLERANCE {
            principal_portion = balance;
            remaining = Decimal::ZERO;
        }

        cumulative_interest += interest;
        cumulative_principal += principal_portion;
        total_extra += extra;
        balance = remaining;

        schedule.push(ScheduledPayment {
            payment_number: period,
            date: payment_date(input.start_date, months_per_period * period)?,
            gross_payment: principal_portion + interest,
            principal_portion,
            interest_portion: interest,
            extra_payment: extra,
            remaining_balance: balance,
            cumulative_interest,
            cumulative_principal,
        });
    }

    let fully_amortized = balance.is_zero();
    if !fully_amortized {
        warnings.push(format!(
            "Schedule reached its {total_periods}-period limit with {balance} outstanding; \
             check that the payment exceeds periodic interest"
        ));
    }

    let payments_made = schedule.len() as u32;
    let baseline_interest = level_payment * Decimal::from(total_periods) - input.principal;
    let periods_saved = if fully_amortized {
        total_periods.saturating_sub(payments_made)
    } else {
        0
    };
    let payoff_date = schedule
        .last()
        .map(|p| p.date)
        .unwrap_or(input.start_date);

    let summary = ScheduleSummary {
        payments_made,
        scheduled_periods: total_periods,
        periodic_payment: base_payment,
        total_paid: cumulative_interest + cumulative_principal,
        total_interest: cumulative_interest,
        total_principal: cumulative_principal,
        total_extra,
        periods_saved,
        interest_saved: (baseline_interest - cumulative_interest).max(Decimal::ZERO),
        payoff_date,
        fully_amortized,
        remaining_balance: balance,
    };

    let yearly = yearly_totals(&schedule, periods_per_year);
    let output = AmortizationOutput {
        schedule,
        summary,
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization, interest on opening balance each period",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "periodic_rate": rate.to_string(),
            "periods": total_periods,
            "payment_frequency": input.payment_frequency,
            "extra_payment": input.extra_payment.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &AmortizationInput) -> LoanFinanceResult<()> {
    LoanParameters::new(input.principal, input.annual_rate_percent, input.term_years).validate()?;

    if input.extra_payment < Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "extra_payment",
            "Extra payment cannot be negative",
        ));
    }
    if let Some(payment) = input.payment_override {
        if payment <= Decimal::ZERO {
            return Err(LoanFinanceError::invalid(
                "payment_override",
                "Payment must be positive",
            ));
        }
    }
    Ok(())
}

/// Offset from the start date rather than the previous row, so a loan
/// starting on the 31st pays on the last day of shorter months without
/// drifting earlier afterwards.
fn payment_date(start: NaiveDate, months: u32) -> LoanFinanceResult<NaiveDate> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| LoanFinanceError::DateError(format!("{start} + {months} months is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mortgage_input() -> AmortizationInput {
        AmortizationInput {
            principal: dec!(100000),
            annual_rate_percent: dec!(6),
            term_years: dec!(30),
            payment_frequency: PaymentFrequency::Monthly,
            extra_payment: Decimal::ZERO,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            payment_override: None,
        }
    }

    #[test]
    fn test_thirty_year_mortgage() {
        let result = generate_schedule(&mortgage_input()).unwrap();
        let out = &result.result;

        assert_eq!(out.schedule.len(), 360);
        assert!((out.summary.periodic_payment - dec!(599.55)).abs() < dec!(0.01));
        assert!((out.summary.total_interest - dec!(115838)).abs() < dec!(1));
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
        assert!(out.summary.fully_amortized);
        assert_eq!(out.summary.periods_saved, 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_first_row_split() {
        let result = generate_schedule(&mortgage_input()).unwrap();
        let first = &result.result.schedule[0];
        // 100000 * 0.005 = 500 interest, the rest of the payment is principal
        assert_eq!(first.interest_portion, dec!(500));
        assert_eq!(first.gross_payment, first.principal_portion + first.interest_portion);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
    }

    #[test]
    fn test_zero_rate_schedule() {
        let mut input = mortgage_input();
        input.principal = dec!(12000);
        input.annual_rate_percent = Decimal::ZERO;
        input.term_years = dec!(1);

        let result = generate_schedule(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.schedule.len(), 12);
        for row in &out.schedule {
            assert_eq!(row.gross_payment, dec!(1000));
            assert_eq!(row.interest_portion, Decimal::ZERO);
        }
        assert_eq!(out.summary.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_shortens_term() {
        let mut input = mortgage_input();
        input.extra_payment = dec!(200);

        let result = generate_schedule(&input).unwrap();
        let out = &result.result;
        assert!(out.schedule.len() < 360);
        assert_eq!(out.summary.periods_saved, 360 - out.summary.payments_made);
        assert!(out.summary.interest_saved > dec!(30000));
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);

        // Final row only pays what is left
        let last = out.schedule.last().unwrap();
        assert!(last.gross_payment <= out.summary.periodic_payment + dec!(200));
    }

    #[test]
    fn test_extra_payment_covering_balance_truncates() {
        let mut input = mortgage_input();
        input.principal = dec!(1000);
        input.extra_payment = dec!(5000);

        let result = generate_schedule(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.schedule.len(), 1);
        let row = &out.schedule[0];
        assert_eq!(row.principal_portion, dec!(1000));
        assert_eq!(row.gross_payment, dec!(1005));
        assert_eq!(row.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_insufficient_payment_overruns() {
        let mut input = mortgage_input();
        input.payment_override = Some(dec!(400));

        let result = generate_schedule(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.schedule.len(), 360);
        assert!(!out.summary.fully_amortized);
        assert!(result.warnings.len() >= 2);
        assert!(matches!(
            out.require_paid_off(),
            Err(LoanFinanceError::ScheduleOverrun { periods: 360, .. })
        ));
    }

    #[test]
    fn test_quarterly_dates_step_three_months() {
        let mut input = mortgage_input();
        input.payment_frequency = PaymentFrequency::Quarterly;
        input.term_years = dec!(1);

        let result = generate_schedule(&input).unwrap();
        let dates: Vec<NaiveDate> = result.result.schedule.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            ]
        );
    }

    #[test]
    fn test_month_end_start_does_not_drift() {
        let mut input = mortgage_input();
        input.start_date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        input.term_years = dec!(1);

        let result = generate_schedule(&input).unwrap();
        let schedule = &result.result.schedule;
        assert_eq!(schedule[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(schedule[1].date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_zero_principal_error() {
        let mut input = mortgage_input();
        input.principal = Decimal::ZERO;
        assert!(matches!(
            generate_schedule(&input),
            Err(LoanFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_negative_extra_payment_error() {
        let mut input = mortgage_input();
        input.extra_payment = dec!(-10);
        assert!(generate_schedule(&input).is_err());
    }
}
