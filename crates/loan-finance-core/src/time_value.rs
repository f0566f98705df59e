//! Closed-form time-value-of-money formulas.
//!
//! Two conventions live here. The loan helpers (`monthly_payment`,
//! `loan_amount_from_payment`, `loan_term_from_payment`, the single-sum and
//! annuity values) take positive magnitudes. The general `pv` / `fv` / `pmt` /
//! `nper` functions use the cash-flow sign convention
//!
//! ```text
//! pv·(1+r)^n + pmt·(1+r·t)·((1+r)^n − 1)/r + fv = 0
//! ```
//!
//! where money paid out is negative and `t` is 1 for beginning-of-period
//! payments. Every rate here is a fractional rate per period.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LoanFinanceError;
use crate::types::{LoanParameters, Money, PaymentTiming, Periods, Rate};
use crate::LoanFinanceResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Convert a nominal annual percentage into a fractional rate per period.
pub fn periodic_rate(annual_rate_percent: Decimal, periods_per_year: u32) -> Rate {
    annual_rate_percent / dec!(100) / Decimal::from(periods_per_year)
}

/// Effective annual rate of a nominal percentage compounded `periods_per_year` times.
pub fn effective_annual_rate(
    annual_rate_percent: Decimal,
    periods_per_year: u32,
) -> LoanFinanceResult<Rate> {
    let rate = periodic_rate(annual_rate_percent, periods_per_year);
    Ok(compound_factor(rate, Decimal::from(periods_per_year))? - Decimal::ONE)
}

/// `(1 + rate)^periods`, failing instead of panicking on overflow.
pub(crate) fn compound_factor(rate: Rate, periods: Periods) -> LoanFinanceResult<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }
    base.checked_powd(periods).ok_or_else(|| {
        LoanFinanceError::DomainError(format!("(1 + {rate})^{periods} is out of range"))
    })
}

/// `a · b`, failing instead of panicking on overflow.
pub(crate) fn checked_product(a: Decimal, b: Decimal) -> LoanFinanceResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| LoanFinanceError::DomainError(format!("{a} × {b} is out of range")))
}

/// Level payment that retires `principal` over `periods` at `rate` per period.
///
/// Evaluated as P·r / (1 − (1+r)^−n) so intermediate values stay near the
/// size of the payment itself.
pub fn amortizing_payment(
    principal: Money,
    rate: Rate,
    periods: Periods,
) -> LoanFinanceResult<Money> {
    if periods <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if rate.is_zero() {
        return Ok(principal / periods);
    }

    let discount = Decimal::ONE / compound_factor(rate, periods)?;
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Err(LoanFinanceError::DomainError(
            "Annuity factor is zero; rate too small for the number of periods".into(),
        ));
    }
    Ok(checked_product(principal, rate)? / denominator)
}

/// Monthly payment on a fully amortizing loan.
///
/// PMT = P·r·(1+r)^n / ((1+r)^n − 1), with r the monthly rate and n the
/// number of months. A zero rate reduces to `principal / (years·12)`.
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Decimal,
    years: Decimal,
) -> LoanFinanceResult<Money> {
    let params = LoanParameters::new(principal, annual_rate_percent, years);
    params.validate()?;

    let months = years * Decimal::from(MONTHS_PER_YEAR);
    let rate = params.periodic_rate(MONTHS_PER_YEAR);
    amortizing_payment(principal, rate, months)
}

/// Discount a single future sum back `periods` periods.
pub fn present_value(
    future_value: Money,
    rate: Rate,
    periods: Periods,
) -> LoanFinanceResult<Money> {
    validate_periods(periods)?;
    let factor = compound_factor(rate, periods)?;
    Ok(future_value / factor)
}

/// Compound a single present sum forward `periods` periods.
pub fn future_value(
    present_value: Money,
    rate: Rate,
    periods: Periods,
) -> LoanFinanceResult<Money> {
    validate_periods(periods)?;
    checked_product(present_value, compound_factor(rate, periods)?)
}

/// Present value of a level payment stream.
pub fn annuity_present_value(
    payment: Money,
    rate: Rate,
    periods: Periods,
    timing: PaymentTiming,
) -> LoanFinanceResult<Money> {
    validate_periods(periods)?;
    if rate.is_zero() {
        return Ok(payment * periods);
    }

    let factor = compound_factor(rate, periods)?;
    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    Ok(payment * annuity_factor * timing_adjustment(rate, timing))
}

/// Future value of a level payment stream.
pub fn annuity_future_value(
    payment: Money,
    rate: Rate,
    periods: Periods,
    timing: PaymentTiming,
) -> LoanFinanceResult<Money> {
    validate_periods(periods)?;
    if rate.is_zero() {
        return Ok(payment * periods);
    }

    let factor = compound_factor(rate, periods)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;
    checked_product(payment, annuity_factor * timing_adjustment(rate, timing))
}

/// Largest loan a level `payment` can retire over `periods` at `rate`.
pub fn loan_amount_from_payment(
    payment: Money,
    rate: Rate,
    periods: Periods,
) -> LoanFinanceResult<Money> {
    if payment <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("payment", "Payment must be positive"));
    }
    if rate < Decimal::ZERO {
        return Err(LoanFinanceError::invalid("rate", "Rate cannot be negative"));
    }
    if periods <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    annuity_present_value(payment, rate, periods, PaymentTiming::End)
}

/// Number of periods a level `payment` needs to retire `principal`.
///
/// n = −ln(1 − P·r/PMT) / ln(1 + r). Fails with a domain error when the
/// payment does not exceed the interest accruing each period.
pub fn loan_term_from_payment(
    principal: Money,
    payment: Money,
    rate: Rate,
) -> LoanFinanceResult<Periods> {
    if principal <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("principal", "Principal must be positive"));
    }
    if payment <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid("payment", "Payment must be positive"));
    }
    if rate < Decimal::ZERO {
        return Err(LoanFinanceError::invalid("rate", "Rate cannot be negative"));
    }
    if rate.is_zero() {
        return Ok(principal / payment);
    }

    let ratio = principal * rate / payment;
    if ratio >= Decimal::ONE {
        return Err(LoanFinanceError::DomainError(format!(
            "Payment of {payment} does not cover periodic interest of {}; the loan never amortizes",
            principal * rate
        )));
    }

    let numerator = ln(Decimal::ONE - ratio)?;
    let denominator = ln(Decimal::ONE + rate)?;
    Ok(-numerator / denominator)
}

// ---------------------------------------------------------------------------
// Cash-flow sign convention
// ---------------------------------------------------------------------------

/// Present Value
pub fn pv(
    rate: Rate,
    nper: Periods,
    pmt: Money,
    fv: Money,
    timing: PaymentTiming,
) -> LoanFinanceResult<Money> {
    validate_periods(nper)?;
    if rate.is_zero() {
        return Ok(-(pmt * nper + fv));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate * timing_adjustment(rate, timing);
    Ok(-(checked_product(pmt, annuity_factor)? + fv) / factor)
}

/// Future Value
pub fn fv(
    rate: Rate,
    nper: Periods,
    pmt: Money,
    present_value: Money,
    timing: PaymentTiming,
) -> LoanFinanceResult<Money> {
    validate_periods(nper)?;
    if rate.is_zero() {
        return Ok(-(present_value + pmt * nper));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate * timing_adjustment(rate, timing);
    Ok(-(checked_product(present_value, factor)? + checked_product(pmt, annuity_factor)?))
}

/// Payment (PMT)
pub fn pmt(
    rate: Rate,
    nper: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> LoanFinanceResult<Money> {
    if nper <= Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / nper);
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate * timing_adjustment(rate, timing);

    if annuity_factor.is_zero() {
        return Err(LoanFinanceError::DomainError(
            "PMT annuity factor is zero".into(),
        ));
    }

    Ok(-(checked_product(present_value, factor)? + future_value) / annuity_factor)
}

/// Number of periods (NPER)
pub fn nper(
    rate: Rate,
    pmt: Money,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> LoanFinanceResult<Periods> {
    if rate.is_zero() {
        if pmt.is_zero() {
            return Err(LoanFinanceError::DomainError(
                "With a zero rate and no payment the balance never changes".into(),
            ));
        }
        let periods = -(present_value + future_value) / pmt;
        return non_negative_periods(periods);
    }
    if rate <= dec!(-1) {
        return Err(LoanFinanceError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }

    // pv·g + a·(g − 1) + fv = 0  =>  g = (a − fv) / (a + pv)
    let a = pmt * timing_adjustment(rate, timing) / rate;
    let denominator = a + present_value;
    if denominator.is_zero() {
        return Err(LoanFinanceError::DomainError(
            "Payment exactly offsets interest on the present value; no finite term exists".into(),
        ));
    }
    let growth = (a - future_value) / denominator;
    if growth <= Decimal::ZERO {
        return Err(LoanFinanceError::DomainError(
            "Cash flow signs are inconsistent; no term solves the equation".into(),
        ));
    }

    let periods = ln(growth)? / ln(Decimal::ONE + rate)?;
    non_negative_periods(periods)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn timing_adjustment(rate: Rate, timing: PaymentTiming) -> Decimal {
    Decimal::ONE + rate * timing.type_flag()
}

fn validate_periods(periods: Periods) -> LoanFinanceResult<()> {
    if periods < Decimal::ZERO {
        return Err(LoanFinanceError::invalid(
            "periods",
            "Number of periods cannot be negative",
        ));
    }
    Ok(())
}

fn non_negative_periods(periods: Periods) -> LoanFinanceResult<Periods> {
    if periods < Decimal::ZERO {
        return Err(LoanFinanceError::DomainError(format!(
            "Cash flows imply a negative term ({periods} periods)"
        )));
    }
    Ok(periods)
}

fn ln(x: Decimal) -> LoanFinanceResult<Decimal> {
    x.checked_ln()
        .ok_or_else(|| LoanFinanceError::DomainError(format!("ln({x}) is undefined")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_thirty_year() {
        let result = monthly_payment(dec!(100000), dec!(6), dec!(30)).unwrap();
        assert!((result - dec!(599.55)).abs() < dec!(0.01));
    }

    #[test]
    fn test_monthly_payment_zero_rate_is_exact() {
        let result = monthly_payment(dec!(12000), Decimal::ZERO, dec!(1)).unwrap();
        assert_eq!(result, dec!(1000));
    }

    #[test]
    fn test_monthly_payment_rejects_zero_principal() {
        assert!(matches!(
            monthly_payment(Decimal::ZERO, dec!(5), dec!(10)),
            Err(LoanFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_pv_basic() {
        let result = pv(dec!(0.08), dec!(10), dec!(-100), dec!(0), PaymentTiming::End).unwrap();
        // PV of annuity: 100 * (1 - 1/1.08^10) / 0.08 = ~671
        assert!((result - dec!(671)).abs() < dec!(2.0));
    }

    #[test]
    fn test_pv_annuity_due_exceeds_ordinary() {
        let ordinary = annuity_present_value(dec!(100), dec!(0.08), dec!(10), PaymentTiming::End).unwrap();
        let due = annuity_present_value(dec!(100), dec!(0.08), dec!(10), PaymentTiming::Beginning).unwrap();
        assert!((due - ordinary * dec!(1.08)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_single_sum_round_trip() {
        let grown = future_value(dec!(1000), dec!(0.05), dec!(10)).unwrap();
        // 1000 * 1.05^10 = 1628.89
        assert!((grown - dec!(1628.89)).abs() < dec!(0.01));
        let back = present_value(grown, dec!(0.05), dec!(10)).unwrap();
        assert!((back - dec!(1000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_loan_term_zero_rate() {
        let n = loan_term_from_payment(dec!(1200), dec!(100), Decimal::ZERO).unwrap();
        assert_eq!(n, dec!(12));
    }

    #[test]
    fn test_loan_term_payment_equal_to_interest_fails() {
        // 100000 * 0.005 = 500 of interest each month
        let result = loan_term_from_payment(dec!(100000), dec!(500), dec!(0.005));
        assert!(matches!(result, Err(LoanFinanceError::DomainError(_))));
    }

    #[test]
    fn test_nper_matches_pmt() {
        let payment = pmt(dec!(0.01), dec!(24), dec!(5000), Decimal::ZERO, PaymentTiming::End).unwrap();
        let n = nper(dec!(0.01), payment, dec!(5000), Decimal::ZERO, PaymentTiming::End).unwrap();
        assert!((n - dec!(24)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_effective_annual_rate_monthly() {
        // 12% nominal compounded monthly: 1.01^12 - 1 = 12.6825%
        let ear = effective_annual_rate(dec!(12), 12).unwrap();
        assert!((ear - dec!(0.126825)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_monthly_payment_large_principal_and_rate() {
        // 600% a year is 50% a month; (1.5)^120 is far larger than the payment
        let payment = monthly_payment(dec!(1000000000000), dec!(600), dec!(10)).unwrap();
        assert!((payment - dec!(500000000000)).abs() < dec!(1));
    }

    #[test]
    fn test_future_value_overflow_is_domain_error() {
        let result = future_value(dec!(10000000000000000000000000000), dec!(9), Decimal::ONE);
        assert!(matches!(result, Err(LoanFinanceError::DomainError(_))));
    }
}
