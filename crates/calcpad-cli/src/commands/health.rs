use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcpad_core::health::{self, BmiInput, MeasurementSystem};

use crate::input;

/// Arguments for body-mass index
#[derive(Args)]
pub struct BmiArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Weight in kg (lb with --imperial)
    #[arg(long)]
    pub weight: Option<Decimal>,

    /// Height in cm (inches with --imperial)
    #[arg(long)]
    pub height: Option<Decimal>,

    /// Use pounds and inches
    #[arg(long)]
    pub imperial: bool,
}

pub fn run_bmi(args: BmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bmi_input: BmiInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        BmiInput {
            weight: args.weight.ok_or("--weight is required (or provide --input)")?,
            height: args.height.ok_or("--height is required (or provide --input)")?,
            system: if args.imperial {
                MeasurementSystem::Imperial
            } else {
                MeasurementSystem::Metric
            },
        }
    };

    let result = health::calculate_bmi(&bmi_input)?;
    Ok(serde_json::to_value(result)?)
}
