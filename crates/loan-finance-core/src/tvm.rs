//! Five-way TVM calculator: give any four of rate, term, present value,
//! payment and future value and solve for the fifth.
//!
//! Inputs follow the cash-flow sign convention of [`crate::time_value::pv`]:
//! money received is positive, money paid out is negative. Omitted money
//! amounts count as zero; the rate and term are required unless they are
//! what is being solved for.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanFinanceError;
use crate::solvers::{solve_rate_newton, solve_rate_tvm, SolverConfig, SolverOutcome};
use crate::time_value::{self, periodic_rate};
use crate::types::*;
use crate::LoanFinanceResult;

/// The quantity to solve for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TvmKind {
    PresentValue,
    FutureValue,
    Payment,
    Rate,
    Periods,
}

/// Input for the TVM calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmInput {
    pub solve_for: TvmKind,
    /// Nominal annual rate as a percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_value: Option<Money>,
    #[serde(default)]
    pub compounding: CompoundingFrequency,
    #[serde(default)]
    pub timing: PaymentTiming,
    /// Overrides the rate solver defaults when solving for the rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverConfig>,
}

/// Result of one TVM calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmResult {
    pub kind: TvmKind,
    /// Money for PV/FV/PMT, annual percentage for RATE, period count for PERIODS
    pub value: Decimal,
    pub explanation: String,
    pub periodic_rate: Rate,
    pub periods: Periods,
    pub converged: bool,
    pub iterations: u32,
}

/// Solve the TVM equation for the requested quantity.
pub fn calculate_tvm(input: &TvmInput) -> LoanFinanceResult<ComputationOutput<TvmResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let per_year = input.compounding.periods_per_year();
    let pv = input.present_value.unwrap_or(Decimal::ZERO);
    let pmt = input.payment.unwrap_or(Decimal::ZERO);
    let fv = input.future_value.unwrap_or(Decimal::ZERO);
    let timing = input.timing;

    let result = match input.solve_for {
        TvmKind::PresentValue => {
            let (rate, periods) = rate_and_periods(input, per_year)?;
            let value = time_value::pv(rate, periods, pmt, fv, timing)?;
            closed_form(
                TvmKind::PresentValue,
                value,
                format!(
                    "Present value of {} per period and {} at the end, over {} periods at {}% per period ({})",
                    pmt,
                    fv,
                    periods.normalize(),
                    percent(rate),
                    timing_label(timing)
                ),
                rate,
                periods,
            )
        }
        TvmKind::FutureValue => {
            let (rate, periods) = rate_and_periods(input, per_year)?;
            let value = time_value::fv(rate, periods, pmt, pv, timing)?;
            closed_form(
                TvmKind::FutureValue,
                value,
                format!(
                    "Future value of {} today plus {} per period, over {} periods at {}% per period ({})",
                    pv,
                    pmt,
                    periods.normalize(),
                    percent(rate),
                    timing_label(timing)
                ),
                rate,
                periods,
            )
        }
        TvmKind::Payment => {
            let (rate, periods) = rate_and_periods(input, per_year)?;
            let value = time_value::pmt(rate, periods, pv, fv, timing)?;
            closed_form(
                TvmKind::Payment,
                value,
                format!(
                    "Level payment moving {} today to {} over {} periods at {}% per period ({})",
                    pv,
                    fv,
                    periods.normalize(),
                    percent(rate),
                    timing_label(timing)
                ),
                rate,
                periods,
            )
        }
        TvmKind::Rate => {
            let periods = require_years(input)? * Decimal::from(per_year);
            let outcome = solve_rate(pv, pmt, fv, periods, timing, input.solver)?;
            if !outcome.converged {
                warnings.push(format!(
                    "Rate solver stopped after {} iterations (last step {}); the rate is an unconverged estimate",
                    outcome.iterations, outcome.last_delta
                ));
            }
            let annual_percent = outcome.value * Decimal::from(per_year) * dec!(100);
            TvmResult {
                kind: TvmKind::Rate,
                value: annual_percent,
                explanation: format!(
                    "Nominal annual rate compounded {} times a year; {}% per period over {} periods",
                    per_year,
                    percent(outcome.value),
                    periods.normalize()
                ),
                periodic_rate: outcome.value,
                periods,
                converged: outcome.converged,
                iterations: outcome.iterations,
            }
        }
        TvmKind::Periods => {
            let rate = periodic_rate(require_rate(input)?, per_year);
            let periods = time_value::nper(rate, pmt, pv, fv, timing)?;
            closed_form(
                TvmKind::Periods,
                periods,
                format!(
                    "{} periods ({} years) at {}% per period",
                    periods.round_dp(4),
                    (periods / Decimal::from(per_year)).round_dp(4),
                    percent(rate)
                ),
                rate,
                periods,
            )
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Time value of money, cash-flow sign convention",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Single-sum problems go to the growth-rate solver, anything with a
/// payment stream to the full TVM solver.
fn solve_rate(
    pv: Money,
    pmt: Money,
    fv: Money,
    periods: Periods,
    timing: PaymentTiming,
    solver: Option<SolverConfig>,
) -> LoanFinanceResult<SolverOutcome> {
    if pmt.is_zero() {
        let config = solver.unwrap_or_else(SolverConfig::single_sum);
        // pv·g + fv = 0  <=>  pv·g = −fv
        solve_rate_newton(pv, -fv, periods, &config)
    } else {
        let config = solver.unwrap_or_else(SolverConfig::annuity);
        solve_rate_tvm(pv, pmt, fv, periods, timing, &config)
    }
}

fn closed_form(
    kind: TvmKind,
    value: Decimal,
    explanation: String,
    rate: Rate,
    periods: Periods,
) -> TvmResult {
    TvmResult {
        kind,
        value,
        explanation,
        periodic_rate: rate,
        periods,
        converged: true,
        iterations: 0,
    }
}

fn rate_and_periods(input: &TvmInput, per_year: u32) -> LoanFinanceResult<(Rate, Periods)> {
    let rate = periodic_rate(require_rate(input)?, per_year);
    let periods = require_years(input)? * Decimal::from(per_year);
    Ok((rate, periods))
}

fn require_rate(input: &TvmInput) -> LoanFinanceResult<Decimal> {
    let rate = input
        .annual_rate_percent
        .ok_or_else(|| LoanFinanceError::invalid("annual_rate_percent", "Interest rate is required"))?;
    if rate < Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    Ok(rate)
}

fn require_years(input: &TvmInput) -> LoanFinanceResult<Decimal> {
    let years = input
        .years
        .ok_or_else(|| LoanFinanceError::invalid("years", "Term in years is required"))?;
    if years <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("years", "Term must be positive"));
    }
    Ok(years)
}

fn percent(rate: Rate) -> Decimal {
    (rate * dec!(100)).round_dp(4).normalize()
}

fn timing_label(timing: PaymentTiming) -> &'static str {
    match timing {
        PaymentTiming::End => "payments at period end",
        PaymentTiming::Beginning => "payments at period start",
    }
}
