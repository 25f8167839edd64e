//! Time-value-of-money primitives shared by the finance calculators.
//!
//! Sign conventions follow the spreadsheet TVM functions: money received is
//! positive, money paid out is negative.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::CalcResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// `(1 + rate)^periods`, reporting overflow instead of panicking.
pub fn growth_factor(rate: Rate, periods: u32) -> CalcResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(periods as u64)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{periods} overflows decimal range"),
        })
}

fn overflow(what: &str) -> CalcError {
    CalcError::InvalidInput {
        field: "rate".into(),
        reason: format!("{what} overflows decimal range"),
    }
}

/// Net Present Value of a series of cash flows, the first at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> CalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(CalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut total = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| overflow(&format!("NPV discount factor at period {t}")))?;
        }
        if discount.is_zero() {
            return Err(CalcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        total = cf
            .checked_div(discount)
            .and_then(|pv| total.checked_add(pv))
            .ok_or_else(|| overflow(&format!("NPV at period {t}")))?;
    }

    Ok(total)
}

/// Internal Rate of Return using Newton-Raphson.
pub fn irr(cash_flows: &[Money], guess: Rate) -> CalcResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return Err(CalcError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR needs at least one negative and one positive cash flow".into(),
        });
    }

    let mut rate = guess;
    let mut value = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let diverged = |last_delta: Decimal| CalcError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: i,
            last_delta,
        };
        let (npv_at_rate, derivative) =
            npv_and_derivative(cash_flows, rate).ok_or_else(|| diverged(value))?;
        value = npv_at_rate;

        if value.abs() < CONVERGENCE_THRESHOLD {
            log::debug!("irr converged to {rate} after {i} iterations");
            return Ok(rate);
        }

        if derivative.is_zero() {
            return Err(diverged(value));
        }

        rate = value
            .checked_div(derivative)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| diverged(value))?;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(CalcError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: value,
    })
}

/// NPV at `rate` and its derivative with respect to the rate, or `None`
/// when the discount factors leave decimal range.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next = discount.checked_mul(one_plus_r)?;
            if next.is_zero() {
                return None;
            }
            let term = cf.checked_div(next)?.checked_mul(Decimal::from(t as u64))?;
            derivative = derivative.checked_sub(term)?;
        }
    }
    Some((value, derivative))
}

/// Present Value
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> CalcResult<Money> {
    if rate.is_zero() {
        return Ok(-(pmt * Decimal::from(nper) + fv));
    }

    let factor = growth_factor(rate, nper)?;
    if factor.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "PV factor".into(),
        });
    }

    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    pmt.checked_mul(annuity_factor)
        .zip(fv.checked_div(factor))
        .and_then(|(annuity, lump)| annuity.checked_add(lump))
        .map(|total| -total)
        .ok_or_else(|| overflow("PV"))
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> CalcResult<Money> {
    if rate.is_zero() {
        return Ok(-(present_value + pmt * Decimal::from(nper)));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    present_value
        .checked_mul(factor)
        .zip(pmt.checked_mul(annuity_factor))
        .and_then(|(grown, annuity)| grown.checked_add(annuity))
        .map(|total| -total)
        .ok_or_else(|| overflow("FV"))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> CalcResult<Money> {
    if nper == 0 {
        return Err(CalcError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(factor)
        .and_then(|grown| grown.checked_add(future_value))
        .and_then(|total| (-total).checked_div(annuity_factor))
        .ok_or_else(|| overflow("PMT"))
}

/// Number of periods (NPER), fractional.
pub fn nper(rate: Rate, pmt: Money, present_value: Money, future_value: Money) -> CalcResult<Decimal> {
    if rate.is_zero() {
        if pmt.is_zero() {
            return Err(CalcError::DivisionByZero {
                context: "NPER with zero rate and zero payment".into(),
            });
        }
        return Ok(-(present_value + future_value) / pmt);
    }
    if rate <= dec!(-1) {
        return Err(CalcError::InvalidInput {
            field: "rate".into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }

    let denominator = pmt + present_value * rate;
    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "NPER: payment equals interest on present value".into(),
        });
    }
    let ratio = (pmt - future_value * rate) / denominator;
    let ln_ratio = ratio.checked_ln().ok_or_else(|| CalcError::InvalidInput {
        field: "pmt".into(),
        reason: "Payment never reaches the future value at this rate".into(),
    })?;
    let ln_growth = (Decimal::ONE + rate)
        .checked_ln()
        .ok_or_else(|| CalcError::InvalidInput {
            field: "rate".into(),
            reason: "ln(1 + rate) undefined".into(),
        })?;

    Ok(ln_ratio / ln_growth)
}

/// Simple interest `P * r * t` (interest only, not the accumulated amount).
pub fn simple_interest(principal: Money, annual_rate: Rate, years: Years) -> CalcResult<Money> {
    if principal < Decimal::ZERO || annual_rate < Decimal::ZERO || years < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "simple_interest".into(),
            reason: "Principal, rate and time must be non-negative".into(),
        });
    }
    Ok(principal * annual_rate * years)
}

/// Accumulated amount with discrete compounding, `P (1 + r/m)^(m t)`.
///
/// `years` must be a whole number of compounding periods.
pub fn compound_amount(
    principal: Money,
    annual_rate: Rate,
    periods_per_year: u32,
    years: u32,
) -> CalcResult<Money> {
    if periods_per_year == 0 {
        return Err(CalcError::InvalidInput {
            field: "periods_per_year".into(),
            reason: "Compounding frequency must be at least 1".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    let period_rate = annual_rate / Decimal::from(periods_per_year);
    Ok(principal * growth_factor(period_rate, periods_per_year * years)?)
}

// ---------------------------------------------------------------------------
// Calculator entry points
// ---------------------------------------------------------------------------

/// Cash-flow calculator input: NPV at an optional rate, and IRR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowInput {
    pub cash_flows: Vec<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irr_guess: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowOutput {
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
    pub total_inflows: Money,
    pub total_outflows: Money,
    pub net_cash_flow: Money,
}

/// NPV and IRR for a cash-flow series. An IRR that fails to converge is
/// reported as a warning rather than an error.
pub fn analyze_cash_flows(input: &CashFlowInput) -> CalcResult<ComputationOutput<CashFlowOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(CalcError::InsufficientData(
            "At least one cash flow is required".into(),
        ));
    }

    let npv_value = match input.discount_rate {
        Some(rate) => Some(npv(rate, &input.cash_flows)?),
        None => None,
    };

    let irr_value = match irr(&input.cash_flows, input.irr_guess.unwrap_or(dec!(0.10))) {
        Ok(rate) => Some(rate),
        Err(e) => {
            warnings.push(format!("IRR unavailable: {e}"));
            None
        }
    };

    let total_inflows: Money = input.cash_flows.iter().filter(|cf| **cf > Decimal::ZERO).sum();
    let total_outflows: Money = input.cash_flows.iter().filter(|cf| **cf < Decimal::ZERO).sum();

    let output = CashFlowOutput {
        npv: npv_value,
        irr: irr_value,
        total_inflows,
        total_outflows,
        net_cash_flow: total_inflows + total_outflows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Discounted cash flow (NPV) and Newton-Raphson IRR",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// TVM solver input. Exactly one of `nper`, `pmt`, `pv`, `fv` is left empty
/// and gets solved for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmInput {
    pub rate: Rate,
    #[serde(default)]
    pub nper: Option<u32>,
    #[serde(default)]
    pub pmt: Option<Money>,
    #[serde(default)]
    pub pv: Option<Money>,
    #[serde(default)]
    pub fv: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TvmVariable {
    Nper,
    Pmt,
    Pv,
    Fv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmOutput {
    pub solved_for: TvmVariable,
    pub value: Decimal,
}

pub fn solve_tvm(input: &TvmInput) -> CalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let missing = [
        input.nper.is_none(),
        input.pmt.is_none(),
        input.pv.is_none(),
        input.fv.is_none(),
    ]
    .iter()
    .filter(|m| **m)
    .count();
    if missing != 1 {
        return Err(CalcError::InvalidInput {
            field: "tvm".into(),
            reason: format!("Exactly one of nper, pmt, pv, fv must be omitted ({missing} omitted)"),
        });
    }

    let (solved_for, value) = match (input.nper, input.pmt, input.pv, input.fv) {
        (None, Some(p), Some(v), Some(f)) => (TvmVariable::Nper, nper(input.rate, p, v, f)?),
        (Some(n), None, Some(v), Some(f)) => (TvmVariable::Pmt, pmt(input.rate, n, v, f)?),
        (Some(n), Some(p), None, Some(f)) => (TvmVariable::Pv, pv(input.rate, n, p, f)?),
        (Some(n), Some(p), Some(v), None) => (TvmVariable::Fv, fv(input.rate, n, p, v)?),
        _ => {
            return Err(CalcError::InsufficientData(
                "TVM solve needs three known variables".into(),
            ))
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Time value of money (spreadsheet sign convention)",
        input,
        Vec::new(),
        elapsed,
        TvmOutput { solved_for, value },
    ))
}
