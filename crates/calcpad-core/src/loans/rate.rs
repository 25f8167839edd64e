//! Nominal annual rate to per-period rate conversion.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::CalcError;
use crate::types::Rate;
use crate::CalcResult;

fn validate(annual_rate_percent: Decimal, periods: u32, field: &str) -> CalcResult<()> {
    if annual_rate_percent < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if periods == 0 {
        return Err(CalcError::InvalidInput {
            field: field.into(),
            reason: "Must be at least 1 per year".into(),
        });
    }
    Ok(())
}

/// `annual_rate_percent / 100 / periods_per_year`.
pub fn period_rate(annual_rate_percent: Decimal, periods_per_year: u32) -> CalcResult<Rate> {
    validate(annual_rate_percent, periods_per_year, "periods_per_year")?;
    Ok(annual_rate_percent / dec!(100) / Decimal::from(periods_per_year))
}

/// Per-payment-period rate when interest compounds at a different frequency
/// than payments are made (e.g. semi-annual compounding, monthly payments).
///
/// Equal frequencies reduce to [`period_rate`] exactly.
pub fn period_rate_compounded(
    annual_rate_percent: Decimal,
    periods_per_year: u32,
    compounding_per_year: u32,
) -> CalcResult<Rate> {
    validate(annual_rate_percent, periods_per_year, "periods_per_year")?;
    validate(annual_rate_percent, compounding_per_year, "compounding_per_year")?;

    if compounding_per_year == periods_per_year || annual_rate_percent.is_zero() {
        return period_rate(annual_rate_percent, periods_per_year);
    }

    let nominal_per_compound = period_rate(annual_rate_percent, compounding_per_year)?;
    let base = Decimal::ONE + nominal_per_compound;

    let grown = if compounding_per_year % periods_per_year == 0 {
        base.checked_powu((compounding_per_year / periods_per_year) as u64)
    } else {
        let exponent = Decimal::from(compounding_per_year) / Decimal::from(periods_per_year);
        base.checked_powd(exponent)
    };

    grown
        .map(|g| g - Decimal::ONE)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Rate conversion overflows decimal range".into(),
        })
}

/// Effective annual rate (APY) as a decimal, `(1 + i/m)^m - 1`.
pub fn effective_annual_rate(annual_rate_percent: Decimal, compounding_per_year: u32) -> CalcResult<Rate> {
    let per_period = period_rate(annual_rate_percent, compounding_per_year)?;
    (Decimal::ONE + per_period)
        .checked_powu(compounding_per_year as u64)
        .map(|g| g - Decimal::ONE)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Effective rate overflows decimal range".into(),
        })
}
