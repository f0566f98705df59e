use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_finance_core::amortization::{self, AmortizationInput};

use super::FrequencyArg;
use crate::input;

/// Which parts of the schedule output to keep
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ScheduleView {
    /// Every payment plus summary and yearly totals
    #[default]
    Full,
    /// Yearly totals and summary
    Yearly,
    /// Summary only
    Summary,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Payment frequency
    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub frequency: FrequencyArg,

    /// Extra principal paid with every payment
    #[arg(long, default_value = "0")]
    pub extra: Decimal,

    /// Loan start date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Fixed payment to use instead of the fully amortizing one
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Parts of the schedule to output
    #[arg(long, value_enum, default_value_t = ScheduleView::Full)]
    pub view: ScheduleView,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs, strict: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: AmortizationInput = input::resolve(args.input.as_deref(), || {
        Ok(AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
            payment_frequency: args.frequency.into(),
            extra_payment: args.extra,
            start_date: args
                .start_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            payment_override: args.payment,
        })
    })?;

    let result = amortization::generate_schedule(&schedule_input)?;
    tracing::debug!(
        payments = result.result.summary.payments_made,
        warnings = result.warnings.len(),
        "schedule generated"
    );
    if strict {
        result.result.require_paid_off()?;
    }

    let mut value = serde_json::to_value(result)?;
    apply_view(&mut value, args.view);
    Ok(value)
}

fn apply_view(value: &mut Value, view: ScheduleView) {
    let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) else {
        return;
    };
    match view {
        ScheduleView::Full => {}
        ScheduleView::Yearly => {
            result.remove("schedule");
        }
        ScheduleView::Summary => {
            result.remove("schedule");
            result.remove("yearly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_view_drops_rows() {
        let mut value = json!({"result": {"schedule": [], "yearly": [], "summary": {}}, "warnings": []});
        apply_view(&mut value, ScheduleView::Summary);
        let result = value["result"].as_object().unwrap();
        assert!(result.contains_key("summary"));
        assert!(!result.contains_key("schedule"));
        assert!(!result.contains_key("yearly"));
    }

    #[test]
    fn test_yearly_view_keeps_yearly() {
        let mut value = json!({"result": {"schedule": [], "yearly": [], "summary": {}}});
        apply_view(&mut value, ScheduleView::Yearly);
        assert!(value["result"].get("yearly").is_some());
        assert!(value["result"].get("schedule").is_none());
    }
}
