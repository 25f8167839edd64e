use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use calcpad_core::units::{self, Dimension, UnitConversionInput, UnitDef};

use crate::input;

/// Arguments for unit conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Value to convert
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<Decimal>,

    /// Source unit (symbol, name or alias, e.g. "cup")
    #[arg(long)]
    pub from: Option<String>,

    /// Target unit (e.g. "ml")
    #[arg(long)]
    pub to: Option<String>,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let conv_input: UnitConversionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        UnitConversionInput {
            value: args.value.ok_or("--value is required (or provide --input)")?,
            from: args.from.ok_or("--from is required (or provide --input)")?,
            to: args.to.ok_or("--to is required (or provide --input)")?,
        }
    };

    let result = units::convert_units(&conv_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for listing units
#[derive(Args)]
pub struct UnitsArgs {
    /// Only list this dimension (length, mass, volume, area, time, speed, data, temperature)
    #[arg(long)]
    pub dimension: Option<Dimension>,
}

#[derive(Serialize)]
struct UnitListing<'a> {
    count: usize,
    units: Vec<&'a UnitDef>,
}

pub fn run_units(args: UnitsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let list: Vec<&UnitDef> = match args.dimension {
        Some(dim) => units::units_for(dim),
        None => units::all_units().iter().collect(),
    };
    let listing = UnitListing {
        count: list.len(),
        units: list,
    };
    Ok(serde_json::json!({ "result": listing }))
}
