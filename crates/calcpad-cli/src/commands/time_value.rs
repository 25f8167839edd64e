use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcpad_core::time_value::{self, CashFlowInput, TvmInput};

use crate::input;

/// Arguments for net present value
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate per period as a decimal (e.g. 0.08)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Cash flows starting at t=0 (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cf_input: CashFlowInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        CashFlowInput {
            cash_flows,
            discount_rate: Some(rate),
            irr_guess: None,
        }
    };

    if cf_input.discount_rate.is_none() {
        return Err("a discount rate is required for NPV".into());
    }
    let result = time_value::analyze_cash_flows(&cf_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for internal rate of return
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows starting at t=0 (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting guess for the solver
    #[arg(long)]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cf_input: CashFlowInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        CashFlowInput {
            cash_flows,
            discount_rate: None,
            irr_guess: args.guess,
        }
    };

    let result = time_value::analyze_cash_flows(&cf_input)?;
    if result.result.irr.is_none() {
        let reason = result
            .warnings
            .first()
            .cloned()
            .unwrap_or_else(|| "IRR did not converge".to_string());
        return Err(reason.into());
    }
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the time-value-of-money solver. Leave exactly one of
/// --nper, --pmt, --pv, --fv unset.
#[derive(Args)]
pub struct TvmArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Rate per period as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of periods
    #[arg(long)]
    pub nper: Option<u32>,

    /// Payment per period (outflows negative)
    #[arg(long, allow_hyphen_values = true)]
    pub pmt: Option<Decimal>,

    /// Present value (outflows negative)
    #[arg(long, allow_hyphen_values = true)]
    pub pv: Option<Decimal>,

    /// Future value (outflows negative)
    #[arg(long, allow_hyphen_values = true)]
    pub fv: Option<Decimal>,
}

pub fn run_tvm(args: TvmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tvm_input: TvmInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        TvmInput {
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            nper: args.nper,
            pmt: args.pmt,
            pv: args.pv,
            fv: args.fv,
        }
    };

    let result = time_value::solve_tvm(&tvm_input)?;
    Ok(serde_json::to_value(result)?)
}
