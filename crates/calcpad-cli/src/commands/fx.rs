use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcpad_core::fx::{self, FxInput, SuppliedRates};

use crate::input;

/// Arguments for currency conversion
#[derive(Args)]
pub struct FxConvertArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount in the source currency
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Source currency code (e.g. USD)
    #[arg(long)]
    pub from: Option<String>,

    /// Target currency code (e.g. EUR)
    #[arg(long)]
    pub to: Option<String>,

    /// JSON rate file: {"base": "USD", "rates": {"EUR": 0.92, ...}}
    #[arg(long)]
    pub rates: Option<String>,

    /// Cache time-to-live in minutes
    #[arg(long)]
    pub ttl_minutes: Option<i64>,
}

pub fn run_fx_convert(args: FxConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fx_input: FxInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let rates: Option<SuppliedRates> = match args.rates {
            Some(ref path) => Some(input::file::read_json(path)?),
            None => None,
        };
        FxInput {
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            from: args.from.ok_or("--from is required (or provide --input)")?,
            to: args.to.ok_or("--to is required (or provide --input)")?,
            rates,
            ttl_minutes: args.ttl_minutes,
        }
    };

    let result = fx::convert(&fx_input)?;
    Ok(serde_json::to_value(result)?)
}
