use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use loan_finance_core::solvers::{self, SolverConfig};
use loan_finance_core::time_value;
use loan_finance_core::PaymentTiming;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn scalar(value: Decimal) -> NapiResult<String> {
    serde_json::to_string(&json!({ "value": value })).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Request types for the scalar formulas
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct MonthlyPaymentRequest {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_years: Decimal,
}

#[derive(Deserialize)]
struct SingleSumRequest {
    amount: Decimal,
    rate: Decimal,
    periods: Decimal,
}

#[derive(Deserialize)]
struct AnnuityRequest {
    payment: Decimal,
    rate: Decimal,
    periods: Decimal,
    #[serde(default)]
    timing: PaymentTiming,
}

#[derive(Deserialize)]
struct LoanTermRequest {
    principal: Decimal,
    payment: Decimal,
    rate: Decimal,
}

#[derive(Deserialize)]
struct GrowthRateRequest {
    present_value: Decimal,
    future_value: Decimal,
    periods: Decimal,
    #[serde(default)]
    solver: Option<SolverConfig>,
}

#[derive(Deserialize)]
struct PaymentRateRequest {
    principal: Decimal,
    payment: Decimal,
    periods: Decimal,
    #[serde(default)]
    solver: Option<SolverConfig>,
}

// ---------------------------------------------------------------------------
// Core formulas
// ---------------------------------------------------------------------------

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: MonthlyPaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment = time_value::monthly_payment(
        input.principal,
        input.annual_rate_percent,
        input.term_years,
    )
    .map_err(to_napi_error)?;
    scalar(payment)
}

#[napi]
pub fn present_value(input_json: String) -> NapiResult<String> {
    let input: SingleSumRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = time_value::present_value(input.amount, input.rate, input.periods)
        .map_err(to_napi_error)?;
    scalar(value)
}

#[napi]
pub fn future_value(input_json: String) -> NapiResult<String> {
    let input: SingleSumRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = time_value::future_value(input.amount, input.rate, input.periods)
        .map_err(to_napi_error)?;
    scalar(value)
}

#[napi]
pub fn annuity_present_value(input_json: String) -> NapiResult<String> {
    let input: AnnuityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value =
        time_value::annuity_present_value(input.payment, input.rate, input.periods, input.timing)
            .map_err(to_napi_error)?;
    scalar(value)
}

#[napi]
pub fn annuity_future_value(input_json: String) -> NapiResult<String> {
    let input: AnnuityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value =
        time_value::annuity_future_value(input.payment, input.rate, input.periods, input.timing)
            .map_err(to_napi_error)?;
    scalar(value)
}

#[napi]
pub fn loan_amount_from_payment(input_json: String) -> NapiResult<String> {
    let input: AnnuityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = time_value::loan_amount_from_payment(input.payment, input.rate, input.periods)
        .map_err(to_napi_error)?;
    scalar(value)
}

#[napi]
pub fn loan_term_from_payment(input_json: String) -> NapiResult<String> {
    let input: LoanTermRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = time_value::loan_term_from_payment(input.principal, input.payment, input.rate)
        .map_err(to_napi_error)?;
    scalar(value)
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_rate_newton(input_json: String) -> NapiResult<String> {
    let input: GrowthRateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = input.solver.unwrap_or_else(SolverConfig::single_sum);
    let outcome = solvers::solve_rate_newton(
        input.present_value,
        input.future_value,
        input.periods,
        &config,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

#[napi]
pub fn solve_rate_for_payment(input_json: String) -> NapiResult<String> {
    let input: PaymentRateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = input.solver.unwrap_or_else(SolverConfig::annuity);
    let outcome =
        solvers::solve_rate_for_payment(input.principal, input.payment, input.periods, &config)
            .map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_finance_core::amortization::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_finance_core::amortization::generate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_apr(input_json: String) -> NapiResult<String> {
    let input: loan_finance_core::apr::AprInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_finance_core::apr::calculate_apr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_tvm(input_json: String) -> NapiResult<String> {
    let input: loan_finance_core::tvm::TvmInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_finance_core::tvm::calculate_tvm(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
