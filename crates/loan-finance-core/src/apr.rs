//! Annual Percentage Rate including up-front fees and discount points.
//!
//! The payment stays pegged to the full principal at the nominal rate while
//! the borrower only receives the principal net of fees. The APR is the
//! annual rate (compounded monthly) at which the payment stream is worth
//! exactly that net amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanFinanceError;
use crate::time_value::{annuity_present_value, effective_annual_rate, monthly_payment};
use crate::types::*;
use crate::LoanFinanceResult;

const MONTHS_PER_YEAR: u32 = 12;
/// Default search span above the nominal rate (100 percentage points)
const DEFAULT_CEILING_MARGIN: Rate = Decimal::ONE;

/// Bounds for the APR search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AprSearchConfig {
    pub max_iterations: u32,
    /// Accepted gap between the payment stream's PV and the net loan amount
    pub tolerance: Money,
    /// Highest annual rate (fraction) the search will consider; defaults
    /// to the nominal rate plus 100 percentage points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rate: Option<Rate>,
}

impl AprSearchConfig {
    /// Upper end of the search for a loan at `nominal_rate` (fraction).
    pub fn ceiling(&self, nominal_rate: Rate) -> Rate {
        self.max_rate.unwrap_or(nominal_rate + DEFAULT_CEILING_MARGIN)
    }
}

impl Default for AprSearchConfig {
    fn default() -> Self {
        AprSearchConfig {
            max_iterations: 100,
            tolerance: dec!(0.0001),
            max_rate: None,
        }
    }
}

/// Input for an APR calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprInput {
    pub principal: Money,
    /// Nominal annual rate as a percentage
    pub nominal_rate_percent: Decimal,
    pub term_years: Decimal,
    /// Flat up-front fees
    #[serde(default)]
    pub fees: Money,
    /// Discount points, each 1% of principal
    #[serde(default)]
    pub points: Decimal,
    #[serde(default)]
    pub search: AprSearchConfig,
}

/// Output of the APR calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    /// APR as a fraction (0.0537 = 5.37%)
    pub apr: Rate,
    pub apr_percent: Decimal,
    pub nominal_rate_percent: Decimal,
    /// APR restated with monthly compounding
    pub effective_annual_rate: Rate,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_fees: Money,
    pub net_loan_amount: Money,
    /// All payments plus fees
    pub total_cost: Money,
    pub iterations: u32,
    pub converged: bool,
}

/// Calculate the APR implied by fees and points on a level-payment loan.
pub fn calculate_apr(input: &AprInput) -> LoanFinanceResult<ComputationOutput<AprOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let total_fees = input.fees + input.points * input.principal / dec!(100);
    let net_loan_amount = input.principal - total_fees;
    if net_loan_amount <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "fees",
            format!("Fees and points of {total_fees} consume the entire principal"),
        ));
    }

    let payment = monthly_payment(input.principal, input.nominal_rate_percent, input.term_years)?;
    let months = input.term_years * Decimal::from(MONTHS_PER_YEAR);
    let nominal_rate = input.nominal_rate_percent / dec!(100);

    let search = bisect_apr(payment, months, net_loan_amount, nominal_rate, &input.search)?;
    if !search.bracketed {
        warnings.push(format!(
            "APR exceeds the search ceiling of {}; result is the ceiling, not a solution",
            input.search.ceiling(nominal_rate)
        ));
    } else if !search.converged {
        warnings.push(format!(
            "APR search stopped after {} iterations with a PV gap of {}; treat the APR as approximate",
            search.iterations, search.gap
        ));
    }

    let total_payments = payment * months;
    let apr_percent = search.apr * dec!(100);
    let output = AprOutput {
        apr: search.apr,
        apr_percent,
        nominal_rate_percent: input.nominal_rate_percent,
        effective_annual_rate: effective_annual_rate(apr_percent, MONTHS_PER_YEAR)?,
        monthly_payment: payment,
        total_interest: total_payments - input.principal,
        total_fees,
        net_loan_amount,
        total_cost: total_payments + total_fees,
        iterations: search.iterations,
        converged: search.converged,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "APR by bisection: PV of payments at APR/12 equals principal net of fees",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct AprSearch {
    apr: Rate,
    iterations: u32,
    converged: bool,
    bracketed: bool,
    gap: Money,
}

/// PV of the payments falls as the rate rises, so the root is bracketed by
/// the nominal rate (where PV equals the full principal) and the ceiling.
fn bisect_apr(
    payment: Money,
    months: Periods,
    target: Money,
    nominal_rate: Rate,
    config: &AprSearchConfig,
) -> LoanFinanceResult<AprSearch> {
    let gap_at = |annual: Rate| -> LoanFinanceResult<Money> {
        let pv = annuity_present_value(
            payment,
            annual / Decimal::from(MONTHS_PER_YEAR),
            months,
            PaymentTiming::End,
        )?;
        Ok(pv - target)
    };

    let mut low = nominal_rate;
    let mut high = config.ceiling(nominal_rate);

    let low_gap = gap_at(low)?;
    if low_gap.abs() < config.tolerance {
        return Ok(AprSearch {
            apr: low,
            iterations: 0,
            converged: true,
            bracketed: true,
            gap: low_gap,
        });
    }
    let high_gap = gap_at(high)?;
    if high_gap > Decimal::ZERO {
        return Ok(AprSearch {
            apr: high,
            iterations: 0,
            converged: false,
            bracketed: false,
            gap: high_gap,
        });
    }

    let mut mid = low;
    let mut gap = low_gap;
    for i in 1..=config.max_iterations {
        mid = (low + high) / dec!(2);
        gap = gap_at(mid)?;

        if gap.abs() < config.tolerance {
            return Ok(AprSearch {
                apr: mid,
                iterations: i,
                converged: true,
                bracketed: true,
                gap,
            });
        }

        if gap > Decimal::ZERO {
            low = mid;
        } else {
            high = mid;
        }
    }

    Ok(AprSearch {
        apr: mid,
        iterations: config.max_iterations,
        converged: false,
        bracketed: true,
        gap,
    })
}

fn validate_input(input: &AprInput) -> LoanFinanceResult<()> {
    LoanParameters::new(input.principal, input.nominal_rate_percent, input.term_years).validate()?;

    if input.fees < Decimal::ZERO {
        return Err(LoanFinanceError::invalid("fees", "Fees cannot be negative"));
    }
    if input.points < Decimal::ZERO {
        return Err(LoanFinanceError::invalid("points", "Points cannot be negative"));
    }
    if input.search.max_iterations == 0 {
        return Err(LoanFinanceError::invalid(
            "search.max_iterations",
            "At least one iteration is required",
        ));
    }
    if input.search.tolerance <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "search.tolerance",
            "Tolerance must be positive",
        ));
    }
    if let Some(max_rate) = input.search.max_rate {
        if max_rate <= input.nominal_rate_percent / dec!(100) {
            return Err(LoanFinanceError::invalid(
                "search.max_rate",
                "Search ceiling must exceed the nominal rate",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> AprInput {
        AprInput {
            principal: dec!(100000),
            nominal_rate_percent: dec!(5),
            term_years: dec!(20),
            fees: dec!(2000),
            points: dec!(1),
            search: AprSearchConfig::default(),
        }
    }

    #[test]
    fn test_fees_and_points_raise_apr() {
        let result = calculate_apr(&sample_input()).unwrap();
        let out = &result.result;

        assert_eq!(out.total_fees, dec!(3000));
        assert_eq!(out.net_loan_amount, dec!(97000));
        assert!(out.converged);
        assert!(out.apr > dec!(0.05));
        assert!(out.apr < dec!(0.06));
        assert_eq!(out.apr_percent, out.apr * dec!(100));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_fees_apr_equals_nominal() {
        let mut input = sample_input();
        input.fees = Decimal::ZERO;
        input.points = Decimal::ZERO;

        let out = calculate_apr(&input).unwrap().result;
        assert!((out.apr - dec!(0.05)).abs() < dec!(0.000001));
        assert_eq!(out.total_cost, out.monthly_payment * dec!(240));
    }

    #[test]
    fn test_iteration_cap_flags_low_confidence() {
        let mut input = sample_input();
        input.search.max_iterations = 3;

        let result = calculate_apr(&input).unwrap();
        assert!(!result.result.converged);
        assert_eq!(result.result.iterations, 3);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_ceiling_too_low_is_not_bracketed() {
        let mut input = sample_input();
        input.search.max_rate = Some(dec!(0.051));

        let result = calculate_apr(&input).unwrap();
        assert!(!result.result.converged);
        assert_eq!(result.result.apr, dec!(0.051));
    }

    #[test]
    fn test_nominal_rate_above_hundred_percent() {
        let input = AprInput {
            principal: dec!(1000),
            nominal_rate_percent: dec!(120),
            term_years: dec!(1),
            fees: dec!(50),
            points: Decimal::ZERO,
            search: AprSearchConfig::default(),
        };

        let result = calculate_apr(&input).unwrap();
        assert!(result.result.converged);
        assert!(result.result.apr > dec!(1.2));
        assert!(result.result.apr < dec!(2.2));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_explicit_ceiling_below_nominal_rejected() {
        let mut input = sample_input();
        input.search.max_rate = Some(dec!(0.04));
        assert!(matches!(
            calculate_apr(&input),
            Err(LoanFinanceError::InvalidInput { ref field, .. }) if field == "search.max_rate"
        ));
    }

    #[test]
    fn test_fees_exceeding_principal_rejected() {
        let mut input = sample_input();
        input.fees = dec!(99500);
        assert!(matches!(
            calculate_apr(&input),
            Err(LoanFinanceError::InvalidInput { .. })
        ));
    }
}
