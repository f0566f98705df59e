use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use loan_finance_core::solvers::{self, SolverConfig, SolverOutcome};
use loan_finance_core::time_value::{self, periodic_rate};
use loan_finance_core::{with_metadata, LoanParameters};

use crate::input;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Arguments for the monthly payment calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate in percent (e.g. 6.5 for 6.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the affordable loan amount calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanAmountArgs {
    /// Monthly payment the borrower can make
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the payoff term calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanTermArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for solving the interest rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SolveRateArgs {
    /// Amount borrowed, or the starting value for a growth-rate solve
    #[arg(long, alias = "present-value")]
    pub principal: Option<Decimal>,

    /// Level payment per period; solves the loan rate
    #[arg(long, conflicts_with = "future_value")]
    pub payment: Option<Decimal>,

    /// Ending value; solves the growth rate of a single sum
    #[arg(long)]
    pub future_value: Option<Decimal>,

    /// Number of periods
    #[arg(long)]
    pub periods: Option<Decimal>,

    /// Periods per year, used to annualise the solved rate
    #[arg(long, default_value = "12")]
    pub periods_per_year: u32,

    /// Newton-Raphson iteration cap
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Stop when successive iterates differ by less than this
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Starting rate per period
    #[arg(long)]
    pub initial_guess: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

// ---------------------------------------------------------------------------
// Request and report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAmountRequest {
    pub payment: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_years: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermRequest {
    pub principal: Decimal,
    pub payment: Decimal,
    pub annual_rate_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveRateRequest {
    pub principal: Decimal,
    #[serde(default)]
    pub payment: Option<Decimal>,
    #[serde(default)]
    pub future_value: Option<Decimal>,
    pub periods: Decimal,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    #[serde(default)]
    pub solver: Option<SolverConfig>,
}

fn default_periods_per_year() -> u32 {
    MONTHS_PER_YEAR
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReport {
    pub monthly_payment: Decimal,
    pub periods: Decimal,
    pub total_paid: Decimal,
    pub total_interest: Decimal,
    pub effective_annual_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanAmountReport {
    pub loan_amount: Decimal,
    pub payment: Decimal,
    pub periods: Decimal,
    pub total_paid: Decimal,
    pub total_interest: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanTermReport {
    /// Fractional number of monthly payments
    pub periods: Decimal,
    /// Payments actually made, the last one partial
    pub whole_periods: Decimal,
    pub years: Decimal,
    pub total_paid: Decimal,
    pub total_interest: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateReport {
    pub method: &'static str,
    pub periodic_rate: Decimal,
    pub annual_rate_percent: Decimal,
    pub effective_annual_rate: Decimal,
    pub iterations: u32,
    pub converged: bool,
    pub last_delta: Decimal,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: LoanParameters = input::resolve(args.input.as_deref(), || {
        Ok(LoanParameters::new(
            args.principal
                .ok_or("--principal is required (or provide --input)")?,
            args.rate.ok_or("--rate is required (or provide --input)")?,
            args.years.ok_or("--years is required (or provide --input)")?,
        ))
    })?;
    Ok(serde_json::to_value(payment_report(&params)?)?)
}

pub fn run_loan_amount(args: LoanAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanAmountRequest = input::resolve(args.input.as_deref(), || {
        Ok(LoanAmountRequest {
            payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
        })
    })?;
    Ok(serde_json::to_value(loan_amount_report(&request)?)?)
}

pub fn run_loan_term(args: LoanTermArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanTermRequest = input::resolve(args.input.as_deref(), || {
        Ok(LoanTermRequest {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
        })
    })?;
    Ok(serde_json::to_value(loan_term_report(&request)?)?)
}

pub fn run_solve_rate(
    args: SolveRateArgs,
    strict: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SolveRateRequest = input::resolve(args.input.as_deref(), || {
        let solver = if args.max_iterations.is_some()
            || args.tolerance.is_some()
            || args.initial_guess.is_some()
        {
            let base = if args.payment.is_some() {
                SolverConfig::annuity()
            } else {
                SolverConfig::single_sum()
            };
            Some(SolverConfig {
                max_iterations: args.max_iterations.unwrap_or(base.max_iterations),
                tolerance: args.tolerance.unwrap_or(base.tolerance),
                initial_guess: args.initial_guess.unwrap_or(base.initial_guess),
            })
        } else {
            None
        };
        Ok(SolveRateRequest {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            payment: args.payment,
            future_value: args.future_value,
            periods: args.periods.ok_or("--periods is required (or provide --input)")?,
            periods_per_year: args.periods_per_year,
            solver,
        })
    })?;

    let start = Instant::now();
    let (method, outcome) = solve_rate(&request)?;
    if strict {
        outcome.into_converged(method)?;
    }

    let mut warnings = Vec::new();
    if !outcome.converged {
        tracing::warn!(method, iterations = outcome.iterations, "rate solver did not converge");
        warnings.push(format!(
            "Solver stopped after {} iterations with last step {}; the rate is an unconverged estimate",
            outcome.iterations, outcome.last_delta
        ));
    }

    let report = rate_report(method, &outcome, request.periods_per_year)?;
    let output = with_metadata(
        "Newton-Raphson rate solve",
        &request,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

pub fn payment_report(
    params: &LoanParameters,
) -> Result<PaymentReport, Box<dyn std::error::Error>> {
    let payment = time_value::monthly_payment(
        params.principal,
        params.annual_rate_percent,
        params.term_years,
    )?;
    let periods = params.term_years * Decimal::from(MONTHS_PER_YEAR);
    let total_paid = payment * periods;

    Ok(PaymentReport {
        monthly_payment: payment,
        periods,
        total_paid,
        total_interest: total_paid - params.principal,
        effective_annual_rate: time_value::effective_annual_rate(
            params.annual_rate_percent,
            MONTHS_PER_YEAR,
        )?,
    })
}

pub fn loan_amount_report(
    request: &LoanAmountRequest,
) -> Result<LoanAmountReport, Box<dyn std::error::Error>> {
    let periods = request.term_years * Decimal::from(MONTHS_PER_YEAR);
    let rate = periodic_rate(request.annual_rate_percent, MONTHS_PER_YEAR);
    let loan_amount = time_value::loan_amount_from_payment(request.payment, rate, periods)?;
    let total_paid = request.payment * periods;

    Ok(LoanAmountReport {
        loan_amount,
        payment: request.payment,
        periods,
        total_paid,
        total_interest: total_paid - loan_amount,
    })
}

pub fn loan_term_report(
    request: &LoanTermRequest,
) -> Result<LoanTermReport, Box<dyn std::error::Error>> {
    let rate = periodic_rate(request.annual_rate_percent, MONTHS_PER_YEAR);
    let periods =
        time_value::loan_term_from_payment(request.principal, request.payment, rate)?;
    let total_paid = request.payment * periods;

    Ok(LoanTermReport {
        periods,
        whole_periods: periods.ceil(),
        years: periods / Decimal::from(MONTHS_PER_YEAR),
        total_paid,
        total_interest: total_paid - request.principal,
    })
}

fn solve_rate(
    request: &SolveRateRequest,
) -> Result<(&'static str, SolverOutcome), Box<dyn std::error::Error>> {
    match (request.payment, request.future_value) {
        (Some(payment), _) => {
            let config = request.solver.unwrap_or_else(SolverConfig::annuity);
            let outcome = solvers::solve_rate_for_payment(
                request.principal,
                payment,
                request.periods,
                &config,
            )?;
            Ok(("solve_rate_for_payment", outcome))
        }
        (None, Some(future_value)) => {
            let config = request.solver.unwrap_or_else(SolverConfig::single_sum);
            let outcome = solvers::solve_rate_newton(
                request.principal,
                future_value,
                request.periods,
                &config,
            )?;
            Ok(("solve_rate_newton", outcome))
        }
        (None, None) => Err("either --payment or --future-value is required".into()),
    }
}

fn rate_report(
    method: &'static str,
    outcome: &SolverOutcome,
    periods_per_year: u32,
) -> Result<RateReport, Box<dyn std::error::Error>> {
    if periods_per_year == 0 {
        return Err("periods_per_year must be positive".into());
    }
    let annual_rate_percent = outcome.value * Decimal::from(periods_per_year) * dec!(100);

    Ok(RateReport {
        method,
        periodic_rate: outcome.value,
        annual_rate_percent,
        effective_annual_rate: time_value::effective_annual_rate(
            annual_rate_percent,
            periods_per_year,
        )?,
        iterations: outcome.iterations,
        converged: outcome.converged,
        last_delta: outcome.last_delta,
    })
}
