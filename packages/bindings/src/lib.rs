use napi::Result as NapiResult;
use napi_derive::napi;

use calcpad_core::{fx, health, loans, time_value, units};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: loans::LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loans::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_payoff(input_json: String) -> NapiResult<String> {
    let input: loans::PayoffInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loans::analyze_payoff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn payoff_for_target(input_json: String) -> NapiResult<String> {
    let input: loans::TargetPayoffInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loans::payoff_for_target(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_tvm(input_json: String) -> NapiResult<String> {
    let input: time_value::TvmInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::solve_tvm(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_npv(input_json: String) -> NapiResult<String> {
    let input: time_value::CashFlowInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if input.discount_rate.is_none() {
        return Err(to_napi_error("discount_rate is required for NPV"));
    }
    let output = time_value::analyze_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_irr(input_json: String) -> NapiResult<String> {
    let input: time_value::CashFlowInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::analyze_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[napi]
pub fn convert_units(input_json: String) -> NapiResult<String> {
    let input: units::UnitConversionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = units::convert_units(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn list_units() -> NapiResult<String> {
    serde_json::to_string(units::all_units()).map_err(to_napi_error)
}

#[napi]
pub fn convert_currency(input_json: String) -> NapiResult<String> {
    let input: fx::FxInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fx::convert(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_bmi(input_json: String) -> NapiResult<String> {
    let input: health::BmiInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = health::calculate_bmi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
