use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_finance_core::apr::{self, AprInput, AprSearchConfig};

use crate::input;

/// Arguments for the APR calculation
#[derive(Args)]
pub struct AprArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Flat up-front fees
    #[arg(long, default_value = "0")]
    pub fees: Decimal,

    /// Discount points (each 1% of principal)
    #[arg(long, default_value = "0")]
    pub points: Decimal,

    /// Highest annual rate (fraction) the search will consider
    /// (defaults to the nominal rate plus 1.0)
    #[arg(long)]
    pub max_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_apr(args: AprArgs, strict: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let apr_input: AprInput = input::resolve(args.input.as_deref(), || {
        let search = AprSearchConfig {
            max_rate: args.max_rate,
            ..AprSearchConfig::default()
        };
        Ok(AprInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            nominal_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
            fees: args.fees,
            points: args.points,
            search,
        })
    })?;

    let result = apr::calculate_apr(&apr_input)?;
    tracing::debug!(
        iterations = result.result.iterations,
        converged = result.result.converged,
        "APR search finished"
    );
    if strict && !result.result.converged {
        return Err(format!(
            "APR search did not converge after {} iterations",
            result.result.iterations
        )
        .into());
    }
    Ok(serde_json::to_value(result)?)
}
