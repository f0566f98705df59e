use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_finance_core::tvm::{self, TvmInput, TvmKind};
use loan_finance_core::CompoundingFrequency;

use super::TimingArg;
use crate::input;

/// The quantity to solve for
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SolveFor {
    Pv,
    Fv,
    Pmt,
    Rate,
    Periods,
}

impl From<SolveFor> for TvmKind {
    fn from(value: SolveFor) -> Self {
        match value {
            SolveFor::Pv => TvmKind::PresentValue,
            SolveFor::Fv => TvmKind::FutureValue,
            SolveFor::Pmt => TvmKind::Payment,
            SolveFor::Rate => TvmKind::Rate,
            SolveFor::Periods => TvmKind::Periods,
        }
    }
}

/// Arguments for the five-way TVM calculator.
///
/// Money follows the cash-flow sign convention: amounts received are
/// positive, amounts paid out negative.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TvmArgs {
    /// Quantity to solve for
    #[arg(long, value_enum)]
    pub solve_for: Option<SolveFor>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Present value
    #[arg(long)]
    pub pv: Option<Decimal>,

    /// Payment per period
    #[arg(long)]
    pub pmt: Option<Decimal>,

    /// Future value
    #[arg(long)]
    pub fv: Option<Decimal>,

    /// Compounding periods per year (1, 2, 4, 12 or 365)
    #[arg(long, default_value = "12")]
    pub compounding: u32,

    /// Payment timing
    #[arg(long, value_enum, default_value_t = TimingArg::End)]
    pub timing: TimingArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tvm(args: TvmArgs, strict: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let tvm_input: TvmInput = input::resolve(args.input.as_deref(), || {
        Ok(TvmInput {
            solve_for: args
                .solve_for
                .ok_or("--solve-for is required (or provide --input)")?
                .into(),
            annual_rate_percent: args.rate,
            years: args.years,
            present_value: args.pv,
            payment: args.pmt,
            future_value: args.fv,
            compounding: CompoundingFrequency::try_from(args.compounding)?,
            timing: args.timing.into(),
            solver: None,
        })
    })?;

    let result = tvm::calculate_tvm(&tvm_input)?;
    tracing::debug!(
        kind = ?result.result.kind,
        warnings = result.warnings.len(),
        "TVM solved"
    );
    if strict && !result.result.converged {
        return Err(format!(
            "Rate solver did not converge after {} iterations",
            result.result.iterations
        )
        .into());
    }
    Ok(serde_json::to_value(result)?)
}
