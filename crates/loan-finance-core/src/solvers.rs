//! Newton-Raphson solvers for rates with no closed-form inverse.
//!
//! Every solver reports a [`SolverOutcome`] instead of failing when the
//! iteration cap is exhausted: the last estimate comes back with
//! `converged == false` so the caller can flag it as low-confidence, or call
//! [`SolverOutcome::into_converged`] to treat it as an error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanFinanceError;
use crate::time_value::{checked_product, compound_factor};
use crate::types::{Money, PaymentTiming, Periods, Rate};
use crate::LoanFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_MAX_ITERATIONS: u32 = 100;
const MIN_RATE: Decimal = dec!(-0.99);
const MAX_RATE: Decimal = dec!(100);
const DERIVATIVE_EPSILON: Decimal = dec!(0.000000000001);

// ---------------------------------------------------------------------------
// Configuration and outcome
// ---------------------------------------------------------------------------

/// Iteration cap, stopping tolerance and starting point for a Newton solve.
///
/// `tolerance` applies to the difference between successive rate iterates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: u32,
    pub tolerance: Decimal,
    pub initial_guess: Rate,
}

impl SolverConfig {
    /// Defaults for growth-rate solves on a single sum: guess 10%, tolerance 1e-4.
    pub fn single_sum() -> Self {
        SolverConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: dec!(0.0001),
            initial_guess: dec!(0.1),
        }
    }

    /// Defaults for periodic rates of a payment stream: guess 1%, tolerance 1e-6.
    pub fn annuity() -> Self {
        SolverConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: dec!(0.000001),
            initial_guess: dec!(0.01),
        }
    }

    fn validate(&self) -> LoanFinanceResult<()> {
        if self.max_iterations == 0 {
            return Err(LoanFinanceError::invalid(
                "max_iterations",
                "At least one iteration is required",
            ));
        }
        if self.tolerance <= Decimal::ZERO {
            return Err(LoanFinanceError::invalid(
                "tolerance",
                "Tolerance must be positive",
            ));
        }
        if self.initial_guess <= MIN_RATE || self.initial_guess > MAX_RATE {
            return Err(LoanFinanceError::invalid(
                "initial_guess",
                format!("Initial guess must lie in ({MIN_RATE}, {MAX_RATE}]"),
            ));
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig::annuity()
    }
}

/// Result of an iterative solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome {
    /// Final estimate (the last iterate when not converged)
    pub value: Rate,
    pub iterations: u32,
    pub converged: bool,
    /// Absolute change between the last two iterates
    pub last_delta: Decimal,
}

impl SolverOutcome {
    fn exact(value: Rate) -> Self {
        SolverOutcome {
            value,
            iterations: 0,
            converged: true,
            last_delta: Decimal::ZERO,
        }
    }

    /// Unwrap the estimate, failing when the solver hit its iteration cap.
    pub fn into_converged(self, function: &str) -> LoanFinanceResult<Rate> {
        if self.converged {
            Ok(self.value)
        } else {
            Err(LoanFinanceError::NonConvergence {
                function: function.into(),
                iterations: self.iterations,
                last_delta: self.last_delta,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Growth rate per period that turns `pv` into `fv` over `periods`.
///
/// Newton-Raphson on f(r) = pv·(1+r)^n − fv with f'(r) = pv·n·(1+r)^(n−1).
pub fn solve_rate_newton(
    pv: Money,
    fv: Money,
    periods: Periods,
    config: &SolverConfig,
) -> LoanFinanceResult<SolverOutcome> {
    require_positive_periods(periods)?;

    newton_raphson("solve_rate_newton", config, |rate| {
        let growth_prev = compound_factor(rate, periods - Decimal::ONE)?;
        let growth = checked_product(growth_prev, Decimal::ONE + rate)?;
        let value = checked_product(pv, growth)? - fv;
        let derivative = checked_product(checked_product(pv, periods)?, growth_prev)?;
        Ok((value, derivative))
    })
}

/// Periodic rate at which a level `payment` retires `principal` over `periods`.
///
/// Newton-Raphson on PMT(r) − payment where PMT(r) = P·r / (1 − v) and
/// v = (1+r)^−n, so PMT'(r) = P·((1 − v) − r·n·v/(1+r)) / (1 − v)².
/// At r = 0 the limits PMT = P/n and PMT' = P·(n+1)/(2n) are used.
pub fn solve_rate_for_payment(
    principal: Money,
    payment: Money,
    periods: Periods,
    config: &SolverConfig,
) -> LoanFinanceResult<SolverOutcome> {
    if principal <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("principal", "Principal must be positive"));
    }
    if payment <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("payment", "Payment must be positive"));
    }
    require_positive_periods(periods)?;

    let total_paid = payment * periods;
    if total_paid < principal {
        return Err(LoanFinanceError::DomainError(format!(
            "Total payments of {total_paid} do not repay principal of {principal}; \
             no non-negative rate exists"
        )));
    }
    if total_paid == principal {
        return Ok(SolverOutcome::exact(Decimal::ZERO));
    }

    newton_raphson("solve_rate_for_payment", config, |rate| {
        if rate.is_zero() {
            let value = principal / periods - payment;
            let derivative = principal * (periods + Decimal::ONE) / (dec!(2) * periods);
            return Ok((value, derivative));
        }

        let discount = Decimal::ONE / compound_factor(rate, periods)?;
        let one_minus_v = Decimal::ONE - discount;
        if one_minus_v.is_zero() {
            return Err(LoanFinanceError::DomainError(format!(
                "Annuity factor vanished at rate {rate}"
            )));
        }
        let discount_slope = periods * discount / (Decimal::ONE + rate);

        let value = checked_product(principal, rate)? / one_minus_v - payment;
        let derivative = checked_product(principal, one_minus_v - rate * discount_slope)?
            / (one_minus_v * one_minus_v);
        Ok((value, derivative))
    })
}

/// Periodic rate solving the full cash-flow TVM equation
/// pv·g + pmt·(1+r·t)·(g − 1)/r + fv = 0.
pub fn solve_rate_tvm(
    pv: Money,
    pmt: Money,
    fv: Money,
    periods: Periods,
    timing: PaymentTiming,
    config: &SolverConfig,
) -> LoanFinanceResult<SolverOutcome> {
    require_positive_periods(periods)?;
    let t = timing.type_flag();

    newton_raphson("solve_rate_tvm", config, |rate| {
        if rate.is_zero() {
            let value = pv + pmt * periods + fv;
            let annuity_slope = periods * (periods - Decimal::ONE) / dec!(2) + t * periods;
            let derivative = pv * periods + pmt * annuity_slope;
            return Ok((value, derivative));
        }

        let one_plus_r = Decimal::ONE + rate;
        let growth = compound_factor(rate, periods)?;
        let growth_slope = checked_product(periods, growth)? / one_plus_r;
        let timing_adj = Decimal::ONE + rate * t;

        let annuity = timing_adj * (growth - Decimal::ONE) / rate;
        let annuity_slope = t * (growth - Decimal::ONE) / rate
            + timing_adj * (growth_slope * rate - (growth - Decimal::ONE)) / (rate * rate);

        let value = checked_product(pv, growth)? + checked_product(pmt, annuity)? + fv;
        let derivative =
            checked_product(pv, growth_slope)? + checked_product(pmt, annuity_slope)?;
        Ok((value, derivative))
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Generic Newton-Raphson driver. `eval` returns (f(r), f'(r)).
fn newton_raphson<F>(
    function: &str,
    config: &SolverConfig,
    mut eval: F,
) -> LoanFinanceResult<SolverOutcome>
where
    F: FnMut(Rate) -> LoanFinanceResult<(Decimal, Decimal)>,
{
    config.validate()?;

    let mut rate = config.initial_guess;
    let mut last_delta = Decimal::MAX;

    for i in 1..=config.max_iterations {
        let (value, derivative) = eval(rate)?;

        if derivative.abs() < DERIVATIVE_EPSILON {
            return Err(LoanFinanceError::DomainError(format!(
                "{function}: derivative is zero at rate {rate}"
            )));
        }

        let step = value.checked_div(derivative).ok_or_else(|| {
            LoanFinanceError::DomainError(format!("{function}: Newton step overflowed at rate {rate}"))
        })?;

        let (next, clamped) = match rate.checked_sub(step) {
            Some(proposed) if (MIN_RATE..=MAX_RATE).contains(&proposed) => (proposed, false),
            Some(proposed) => (proposed.clamp(MIN_RATE, MAX_RATE), true),
            None if step > Decimal::ZERO => (MIN_RATE, true),
            None => (MAX_RATE, true),
        };

        // A clamped step never counts as convergence; pinned at a bound means
        // the root lies outside the rate range or does not exist.
        if clamped {
            last_delta = step.abs();
            if next == rate {
                return Ok(SolverOutcome {
                    value: rate,
                    iterations: i,
                    converged: false,
                    last_delta,
                });
            }
            rate = next;
            continue;
        }

        last_delta = (next - rate).abs();
        rate = next;

        if last_delta < config.tolerance {
            return Ok(SolverOutcome {
                value: rate,
                iterations: i,
                converged: true,
                last_delta,
            });
        }
    }

    Ok(SolverOutcome {
        value: rate,
        iterations: config.max_iterations,
        converged: false,
        last_delta,
    })
}

fn require_positive_periods(periods: Periods) -> LoanFinanceResult<()> {
    if periods <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    Ok(())
}
