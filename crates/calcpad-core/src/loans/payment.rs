//! Periodic payment and payoff-period solvers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use super::schedule::{generate_schedule, ScheduleSpec};
use super::{period_cap, LoanTerms};
use crate::error::CalcError;
use crate::time_value::growth_factor;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Level payment for a fixed-rate, fixed-term loan (annuity formula).
pub fn fixed_payment(principal: Money, period_rate: Rate, term_periods: u32) -> CalcResult<Money> {
    if principal <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if term_periods == 0 {
        return Err(CalcError::InvalidInput {
            field: "term_periods".into(),
            reason: "Term must be at least one period".into(),
        });
    }
    if period_rate < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "period_rate".into(),
            reason: "Period rate cannot be negative".into(),
        });
    }

    if period_rate.is_zero() {
        return Ok(principal / Decimal::from(term_periods));
    }

    // P r / (1 - (1+r)^-n); 1/g keeps the intermediate no larger than P r.
    let g = growth_factor(period_rate, term_periods)?;
    let denominator = Decimal::ONE - Decimal::ONE / g;
    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }
    principal
        .checked_mul(period_rate)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(|| CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Payment overflows decimal range".into(),
        })
}

/// Interest accrued in one period on the full principal. Any fixed payment
/// at or below this never amortises.
pub fn interest_only_payment(principal: Money, period_rate: Rate) -> Money {
    principal.checked_mul(period_rate).unwrap_or(Decimal::MAX)
}

fn ensure_amortizes(principal: Money, period_rate: Rate, payment: Money) -> CalcResult<()> {
    let interest = interest_only_payment(principal, period_rate);
    if payment <= interest {
        return Err(CalcError::NonAmortizing { payment, interest });
    }
    Ok(())
}

/// Number of periods needed to repay `principal` with a fixed `payment`,
/// found by running the schedule. Bounded by [`period_cap`].
pub fn periods_for_payment(
    principal: Money,
    period_rate: Rate,
    payment: Money,
    periods_per_year: u32,
) -> CalcResult<u32> {
    if principal <= Decimal::ZERO {
        return Ok(0);
    }
    let max_periods = period_cap(periods_per_year)?;
    ensure_amortizes(principal, period_rate, payment)?;

    let schedule = generate_schedule(&ScheduleSpec {
        principal,
        period_rate,
        payment,
        extra_payment: Decimal::ZERO,
        lump_sums: Vec::new(),
        periods_per_year,
        term_periods: None,
        max_periods,
        start_date: None,
    })?;
    Ok(schedule.len() as u32)
}

/// Closed-form inverse of the annuity formula, `-ln(1 - P r / A) / ln(1 + r)`,
/// rounded up to whole periods.
pub fn periods_closed_form(principal: Money, period_rate: Rate, payment: Money) -> CalcResult<u32> {
    if principal <= Decimal::ZERO {
        return Ok(0);
    }
    ensure_amortizes(principal, period_rate, payment)?;

    let exact = if period_rate.is_zero() {
        principal / payment
    } else {
        let ratio = Decimal::ONE - principal * period_rate / payment;
        let numerator = ratio.checked_ln().ok_or_else(|| CalcError::NonAmortizing {
            payment,
            interest: interest_only_payment(principal, period_rate),
        })?;
        let denominator = (Decimal::ONE + period_rate)
            .checked_ln()
            .ok_or_else(|| CalcError::DivisionByZero {
                context: "ln(1 + period_rate)".into(),
            })?;
        if denominator.is_zero() {
            return Err(CalcError::DivisionByZero {
                context: "ln(1 + period_rate)".into(),
            });
        }
        -numerator / denominator
    };

    // ln is approximate; don't let 60.0000000001 become 61.
    (exact - dec!(0.000001))
        .ceil()
        .max(Decimal::ONE)
        .to_u32()
        .ok_or_else(|| CalcError::InvalidInput {
            field: "payment".into(),
            reason: "Period count exceeds representable range".into(),
        })
}

/// Payment required to clear the loan in exactly `target_periods`.
pub fn payment_for_target_periods(
    principal: Money,
    period_rate: Rate,
    target_periods: u32,
    periods_per_year: u32,
) -> CalcResult<Money> {
    let cap = period_cap(periods_per_year)?;
    if target_periods > cap {
        return Err(CalcError::IterationBound { max_periods: cap });
    }
    fixed_payment(principal, period_rate, target_periods)
}

/// Extra amount per period, on top of the contractual payment, that pays the
/// loan off in `target_periods`. Zero when the contractual term is already
/// at least as short.
pub fn extra_for_target(terms: &LoanTerms, target_periods: u32) -> CalcResult<Money> {
    let r = terms.period_rate()?;
    let contractual = fixed_payment(terms.principal, r, terms.term_periods)?;
    let required =
        payment_for_target_periods(terms.principal, r, target_periods, terms.periods_per_year)?;
    Ok((required - contractual).max(Decimal::ZERO))
}
