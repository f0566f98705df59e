use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanFinanceError;
use crate::LoanFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
/// The engine is currency-agnostic; symbols are applied by the caller.
pub type Money = Decimal;

/// Fractional rates (0.05 = 5%). Inputs named `*_percent` are the exception.
pub type Rate = Decimal;

/// Period counts. Fractional when produced by a closed-form solve.
pub type Periods = Decimal;

/// How often a scheduled loan payment falls due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::SemiAnnual => 2,
            PaymentFrequency::Annual => 1,
        }
    }

    /// Calendar months between two consecutive payments.
    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }
}

/// Whether annuity payments fall at the end (ordinary annuity) or the
/// beginning (annuity due) of each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    #[default]
    End,
    Beginning,
}

impl PaymentTiming {
    /// The `type` flag of the cash-flow TVM equation: 0 for end, 1 for beginning.
    pub fn type_flag(self) -> Decimal {
        match self {
            PaymentTiming::End => Decimal::ZERO,
            PaymentTiming::Beginning => Decimal::ONE,
        }
    }
}

/// Compounding periods per year for the TVM calculator.
///
/// Serialised as the bare period count (1, 2, 4, 12 or 365).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CompoundingFrequency {
    Annual,
    SemiAnnual,
    Quarterly,
    #[default]
    Monthly,
    Daily,
}

impl CompoundingFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Annual => 1,
            CompoundingFrequency::SemiAnnual => 2,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Daily => 365,
        }
    }
}

impl TryFrom<u32> for CompoundingFrequency {
    type Error = LoanFinanceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CompoundingFrequency::Annual),
            2 => Ok(CompoundingFrequency::SemiAnnual),
            4 => Ok(CompoundingFrequency::Quarterly),
            12 => Ok(CompoundingFrequency::Monthly),
            365 => Ok(CompoundingFrequency::Daily),
            other => Err(LoanFinanceError::invalid(
                "compounding",
                format!("Compounding frequency must be one of 1, 2, 4, 12, 365; got {other}"),
            )),
        }
    }
}

impl From<CompoundingFrequency> for u32 {
    fn from(value: CompoundingFrequency) -> Self {
        value.periods_per_year()
    }
}

/// The three numbers every loan calculation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    /// Nominal annual rate as a percentage (5.5 means 5.5%)
    pub annual_rate_percent: Decimal,
    pub term_years: Decimal,
}

impl LoanParameters {
    pub fn new(principal: Money, annual_rate_percent: Decimal, term_years: Decimal) -> Self {
        LoanParameters {
            principal,
            annual_rate_percent,
            term_years,
        }
    }

    /// Reject parameters that no amortizing loan can be built from.
    pub fn validate(&self) -> LoanFinanceResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanFinanceError::invalid(
                "principal",
                "Principal must be positive",
            ));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(LoanFinanceError::invalid(
                "annual_rate_percent",
                "Interest rate cannot be negative",
            ));
        }
        if self.term_years <= Decimal::ZERO {
            return Err(LoanFinanceError::invalid(
                "term_years",
                "Loan term must be positive",
            ));
        }
        Ok(())
    }

    /// Fractional rate per payment period.
    pub fn periodic_rate(&self, periods_per_year: u32) -> Rate {
        crate::time_value::periodic_rate(self.annual_rate_percent, periods_per_year)
    }

    /// Whole number of payment periods over the term (rounded to nearest).
    pub fn total_periods(&self, periods_per_year: u32) -> LoanFinanceResult<u32> {
        let periods = (self.term_years * Decimal::from(periods_per_year)).round();
        match u32::try_from(periods) {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(LoanFinanceError::invalid(
                "term_years",
                format!("Term must cover at least one payment period, got {periods} periods"),
            )),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_frequency_months_per_period() {
        assert_eq!(PaymentFrequency::Monthly.months_per_period(), 1);
        assert_eq!(PaymentFrequency::Quarterly.months_per_period(), 3);
        assert_eq!(PaymentFrequency::SemiAnnual.months_per_period(), 6);
        assert_eq!(PaymentFrequency::Annual.months_per_period(), 12);
    }

    #[test]
    fn test_compounding_serde_as_number() {
        let c: CompoundingFrequency = serde_json::from_str("365").unwrap();
        assert_eq!(c, CompoundingFrequency::Daily);
        assert_eq!(serde_json::to_string(&CompoundingFrequency::Quarterly).unwrap(), "4");
        assert!(serde_json::from_str::<CompoundingFrequency>("3").is_err());
    }

    #[test]
    fn test_total_periods_rounds_and_rejects_zero() {
        let params = LoanParameters::new(dec!(1000), dec!(5), dec!(2.5));
        assert_eq!(params.total_periods(12).unwrap(), 30);
        assert_eq!(params.total_periods(4).unwrap(), 10);

        let tiny = LoanParameters::new(dec!(1000), dec!(5), dec!(0.01));
        assert!(tiny.total_periods(12).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_principal() {
        let params = LoanParameters::new(Decimal::ZERO, dec!(5), dec!(10));
        assert!(matches!(
            params.validate(),
            Err(LoanFinanceError::InvalidInput { ref field, .. }) if field == "principal"
        ));
    }
}
