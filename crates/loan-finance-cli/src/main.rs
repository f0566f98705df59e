mod commands;
mod currency;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::prelude::*;

use commands::apr::AprArgs;
use commands::convert::ConvertArgs;
use commands::loan::{LoanAmountArgs, LoanTermArgs, PaymentArgs, SolveRateArgs};
use commands::schedule::ScheduleArgs;
use commands::tvm::TvmArgs;

/// Loan and time-value-of-money calculations
#[derive(Parser)]
#[command(
    name = "loanc",
    version,
    about = "Loan and time-value-of-money calculations",
    long_about = "A CLI for loan payment, amortization, APR and time-value-of-money \
                  calculations with decimal precision. Every command accepts flags, \
                  a JSON file via --input, or JSON piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Currency code used to label money in table and minimal output
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Fail when a solver does not converge or a schedule is not paid off
    #[arg(long, global = true)]
    strict: bool,

    /// Log filter used when RUST_LOG is unset (e.g. debug, info, warn)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment for a fully amortizing loan
    Payment(PaymentArgs),
    /// Full amortization schedule with summary and yearly totals
    Schedule(ScheduleArgs),
    /// APR including up-front fees and discount points
    Apr(AprArgs),
    /// Solve the time-value-of-money equation for PV, FV, PMT, rate or periods
    Tvm(TvmArgs),
    /// Largest loan a monthly payment can support
    LoanAmount(LoanAmountArgs),
    /// Number of payments needed to retire a loan
    LoanTerm(LoanTermArgs),
    /// Solve the interest rate of a loan or a single-sum investment
    SolveRate(SolveRateArgs),
    /// Convert an amount at static reference exchange rates
    Convert(ConvertArgs),
    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Payment(_) => "payment",
            Commands::Schedule(_) => "schedule",
            Commands::Apr(_) => "apr",
            Commands::Tvm(_) => "tvm",
            Commands::LoanAmount(_) => "loan-amount",
            Commands::LoanTerm(_) => "loan-term",
            Commands::SolveRate(_) => "solve-rate",
            Commands::Convert(_) => "convert",
            Commands::Version => "version",
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let display_currency = match cli.currency.as_deref().map(currency::lookup).transpose() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let strict = cli.strict;
    tracing::debug!(command = cli.command.name(), strict, "dispatching");
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, strict),
        Commands::Apr(args) => commands::apr::run_apr(args, strict),
        Commands::Tvm(args) => commands::tvm::run_tvm(args, strict),
        Commands::LoanAmount(args) => commands::loan::run_loan_amount(args),
        Commands::LoanTerm(args) => commands::loan::run_loan_term(args),
        Commands::SolveRate(args) => commands::loan::run_solve_rate(args, strict),
        Commands::Convert(args) => commands::convert::run_convert(args),
        Commands::Version => {
            println!("loanc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            let warnings = value
                .get("warnings")
                .and_then(|w| w.as_array())
                .map_or(0, |w| w.len());
            tracing::debug!(warnings, "command completed");
            output::format_output(&cli.output, &value, display_currency);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
