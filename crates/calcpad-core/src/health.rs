//! Body-mass index.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CalcResult;

/// Imperial BMI constant: kg/m² from lb/in².
const IMPERIAL_FACTOR: Decimal = dec!(703);

const UNDERWEIGHT_BELOW: Decimal = dec!(18.5);
const OVERWEIGHT_FROM: Decimal = dec!(25);
const OBESE_FROM: Decimal = dec!(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSystem {
    /// Weight in kilograms, height in centimetres.
    Metric,
    /// Weight in pounds, height in inches.
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiInput {
    pub weight: Decimal,
    pub height: Decimal,
    #[serde(default = "default_system")]
    pub system: MeasurementSystem,
}

fn default_system() -> MeasurementSystem {
    MeasurementSystem::Metric
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: Decimal) -> Self {
        if bmi < UNDERWEIGHT_BELOW {
            BmiCategory::Underweight
        } else if bmi < OVERWEIGHT_FROM {
            BmiCategory::Normal
        } else if bmi < OBESE_FROM {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiOutput {
    pub bmi: Decimal,
    pub category: BmiCategory,
    /// Weight band (same units as the input) for BMI 18.5–25 at this height.
    pub healthy_weight_min: Decimal,
    pub healthy_weight_max: Decimal,
}

pub fn calculate_bmi(input: &BmiInput) -> CalcResult<ComputationOutput<BmiOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.weight <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "weight".into(),
            reason: "Weight must be positive".into(),
        });
    }
    if input.height <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "height".into(),
            reason: "Height must be positive".into(),
        });
    }

    // weight per squared height, before the unit constant
    let (height_sq, factor) = match input.system {
        MeasurementSystem::Metric => {
            let metres = input.height / dec!(100);
            (metres * metres, Decimal::ONE)
        }
        MeasurementSystem::Imperial => (input.height * input.height, IMPERIAL_FACTOR),
    };

    let bmi = input.weight * factor / height_sq;
    if bmi > dec!(100) || bmi < dec!(5) {
        warnings.push(format!(
            "BMI of {} is outside the plausible human range; check units",
            bmi.round_dp(1)
        ));
    }

    let output = BmiOutput {
        bmi,
        category: BmiCategory::from_bmi(bmi),
        healthy_weight_min: UNDERWEIGHT_BELOW * height_sq / factor,
        healthy_weight_max: OVERWEIGHT_FROM * height_sq / factor,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Body-mass index (WHO adult categories)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
