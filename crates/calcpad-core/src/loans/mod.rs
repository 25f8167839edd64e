//! Fixed-rate amortising loans: level payments, payoff schedules, extra
//! payments and target-date payoff.
//!
//! Flow: [`rate`] turns the nominal annual rate into a per-period rate,
//! [`payment`] solves the level payment (or the period count for a given
//! payment), [`schedule`] runs the period-by-period ledger and [`aggregate`]
//! rolls it up into totals and yearly buckets.

pub mod aggregate;
pub mod payment;
pub mod rate;
pub mod schedule;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

use aggregate::{ScheduleTotals, YearlyBucket};
use schedule::{generate_schedule, PaymentRow, Schedule, ScheduleSpec};

/// Balances at or below this are treated as repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.000000001);

/// Hard bound on schedule length, in years.
pub const MAX_YEARS: u32 = 100;

/// Daily payments are the finest frequency accepted.
pub const MAX_PERIODS_PER_YEAR: u32 = 365;

const HIGH_RATE_WARNING_PERCENT: Decimal = dec!(50);
const LONG_TERM_WARNING_YEARS: u32 = 50;

fn default_periods_per_year() -> u32 {
    12
}

/// Longest schedule allowed at `periods_per_year`, i.e. [`MAX_YEARS`] worth
/// of periods.
pub fn period_cap(periods_per_year: u32) -> CalcResult<u32> {
    if periods_per_year == 0 || periods_per_year > MAX_PERIODS_PER_YEAR {
        return Err(CalcError::InvalidInput {
            field: "periods_per_year".into(),
            reason: format!("Must be between 1 and {MAX_PERIODS_PER_YEAR} per year"),
        });
    }
    MAX_YEARS
        .checked_mul(periods_per_year)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "periods_per_year".into(),
            reason: "Period cap overflows".into(),
        })
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Contractual loan terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate in percent (5 = 5%).
    pub annual_rate_percent: Decimal,
    pub term_periods: u32,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// Defaults to `periods_per_year`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding_per_year: Option<u32>,
}

impl LoanTerms {
    pub fn validate(&self) -> CalcResult<()> {
        if self.principal < Decimal::ZERO {
            return Err(CalcError::InvalidInput {
                field: "principal".into(),
                reason: "Principal cannot be negative".into(),
            });
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(CalcError::InvalidInput {
                field: "annual_rate_percent".into(),
                reason: "Interest rate cannot be negative".into(),
            });
        }
        if self.term_periods == 0 {
            return Err(CalcError::InvalidInput {
                field: "term_periods".into(),
                reason: "Term must be at least one period".into(),
            });
        }
        if self.term_periods > self.max_periods()? {
            return Err(CalcError::InvalidInput {
                field: "term_periods".into(),
                reason: format!("Term cannot exceed {MAX_YEARS} years"),
            });
        }
        Ok(())
    }

    pub fn compounding(&self) -> u32 {
        self.compounding_per_year.unwrap_or(self.periods_per_year)
    }

    pub fn period_rate(&self) -> CalcResult<Rate> {
        rate::period_rate_compounded(
            self.annual_rate_percent,
            self.periods_per_year,
            self.compounding(),
        )
    }

    pub fn max_periods(&self) -> CalcResult<u32> {
        period_cap(self.periods_per_year)
    }
}

/// One-off principal prepayment made together with the payment of `period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSum {
    pub period: u32,
    pub amount: Money,
}

/// Fixed-term loan, optionally with recurring extra payments and lump sums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub terms: LoanTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lump_sums: Vec<LumpSum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Pay a fixed amount each period until the balance is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffInput {
    pub principal: Money,
    pub annual_rate_percent: Decimal,
    pub payment: Money,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding_per_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lump_sums: Vec<LumpSum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Pay off a fixed-term loan early, by `target_periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPayoffInput {
    pub terms: LoanTerms,
    pub target_periods: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanMode {
    FixedTerm,
    TargetPayment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummary {
    pub mode: LoanMode,
    pub periodic_payment: Money,
    pub period_rate: Rate,
    pub effective_annual_rate: Rate,
    pub number_of_payments: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra_principal: Money,
    pub total_paid: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    /// Against the same loan without extra payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_saved: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods_saved: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub summary: LoanSummary,
    pub schedule: Vec<PaymentRow>,
    pub yearly: Vec<YearlyBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPayoffOutput {
    pub target_periods: u32,
    pub contractual_payment: Money,
    pub required_payment: Money,
    pub extra_payment_needed: Money,
    pub summary: LoanSummary,
    pub yearly: Vec<YearlyBucket>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortise a fixed-term loan.
pub fn analyze_loan(input: &LoanInput) -> CalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let terms = &input.terms;

    terms.validate()?;
    validate_extras(input.extra_payment, &input.lump_sums)?;
    term_warnings(
        terms.annual_rate_percent,
        terms.term_periods,
        terms.periods_per_year,
        &mut warnings,
    );

    let r = terms.period_rate()?;
    let payment = if terms.principal.is_zero() {
        warnings.push("Principal is zero; nothing to amortise".into());
        Decimal::ZERO
    } else {
        payment::fixed_payment(terms.principal, r, terms.term_periods)?
    };
    log::debug!(
        "fixed-term loan: principal={} r={} n={} payment={}",
        terms.principal,
        r,
        terms.term_periods,
        payment
    );

    let spec = ScheduleSpec {
        principal: terms.principal,
        period_rate: r,
        payment,
        extra_payment: input.extra_payment.unwrap_or(Decimal::ZERO),
        lump_sums: input.lump_sums.clone(),
        periods_per_year: terms.periods_per_year,
        term_periods: Some(terms.term_periods),
        max_periods: terms.max_periods()?,
        start_date: input.start_date,
    };

    let output = build_output(
        LoanMode::FixedTerm,
        &spec,
        terms.annual_rate_percent,
        terms.compounding(),
        &mut warnings,
    )?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortisation (annuity formula)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Amortise with a caller-chosen payment and report how long payoff takes.
pub fn analyze_payoff(input: &PayoffInput) -> CalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    if input.payment <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "payment".into(),
            reason: "Payment must be positive".into(),
        });
    }
    validate_extras(input.extra_payment, &input.lump_sums)?;
    let max_periods = period_cap(input.periods_per_year)?;

    let compounding = input.compounding_per_year.unwrap_or(input.periods_per_year);
    let r = rate::period_rate_compounded(input.annual_rate_percent, input.periods_per_year, compounding)?;

    if input.principal.is_zero() {
        warnings.push("Principal is zero; nothing to amortise".into());
    } else {
        let interest = payment::interest_only_payment(input.principal, r);
        let boosted = input.payment + input.extra_payment.unwrap_or(Decimal::ZERO);
        if boosted <= interest {
            return Err(CalcError::NonAmortizing {
                payment: boosted,
                interest,
            });
        }
        if input.payment >= input.principal + interest {
            warnings.push("Payment covers the whole balance; loan repaid in one period".into());
        }
    }
    if input.annual_rate_percent > HIGH_RATE_WARNING_PERCENT {
        warnings.push(format!(
            "Annual rate of {}% is unusually high",
            input.annual_rate_percent
        ));
    }

    let spec = ScheduleSpec {
        principal: input.principal,
        period_rate: r,
        payment: input.payment,
        extra_payment: input.extra_payment.unwrap_or(Decimal::ZERO),
        lump_sums: input.lump_sums.clone(),
        periods_per_year: input.periods_per_year,
        term_periods: None,
        max_periods,
        start_date: input.start_date,
    };

    let output = build_output(
        LoanMode::TargetPayment,
        &spec,
        input.annual_rate_percent,
        compounding,
        &mut warnings,
    )?;
    log::debug!(
        "target-payment loan repaid in {} periods",
        output.summary.number_of_payments
    );
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment payoff schedule",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Payment (and extra over the contractual payment) that clears the loan in
/// `target_periods`.
pub fn payoff_for_target(input: &TargetPayoffInput) -> CalcResult<ComputationOutput<TargetPayoffOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let terms = &input.terms;

    terms.validate()?;
    if terms.principal.is_zero() {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive to solve a payoff target".into(),
        });
    }
    if input.target_periods == 0 {
        return Err(CalcError::InvalidInput {
            field: "target_periods".into(),
            reason: "Target must be at least one period".into(),
        });
    }
    if input.target_periods >= terms.term_periods {
        warnings.push(format!(
            "Target of {} periods is not earlier than the {}-period term; no extra payment needed",
            input.target_periods, terms.term_periods
        ));
    }

    let r = terms.period_rate()?;
    let contractual = payment::fixed_payment(terms.principal, r, terms.term_periods)?;
    let extra = payment::extra_for_target(terms, input.target_periods)?;

    let spec = ScheduleSpec {
        principal: terms.principal,
        period_rate: r,
        payment: contractual,
        extra_payment: extra,
        lump_sums: Vec::new(),
        periods_per_year: terms.periods_per_year,
        term_periods: Some(terms.term_periods),
        max_periods: terms.max_periods()?,
        start_date: input.start_date,
    };
    let output = build_output(
        LoanMode::FixedTerm,
        &spec,
        terms.annual_rate_percent,
        terms.compounding(),
        &mut warnings,
    )?;

    let result = TargetPayoffOutput {
        target_periods: input.target_periods,
        contractual_payment: contractual,
        required_payment: contractual + extra,
        extra_payment_needed: extra,
        summary: output.summary,
        yearly: output.yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Target-date payoff (annuity payment over the shortened term)",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_extras(extra: Option<Money>, lump_sums: &[LumpSum]) -> CalcResult<()> {
    if extra.is_some_and(|e| e < Decimal::ZERO) {
        return Err(CalcError::InvalidInput {
            field: "extra_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    for lump in lump_sums {
        if lump.period == 0 {
            return Err(CalcError::InvalidInput {
                field: "lump_sums".into(),
                reason: "Lump sum periods start at 1".into(),
            });
        }
        if lump.amount < Decimal::ZERO {
            return Err(CalcError::InvalidInput {
                field: "lump_sums".into(),
                reason: format!("Lump sum at period {} cannot be negative", lump.period),
            });
        }
    }
    Ok(())
}

fn term_warnings(
    annual_rate_percent: Decimal,
    term_periods: u32,
    periods_per_year: u32,
    warnings: &mut Vec<String>,
) {
    if annual_rate_percent > HIGH_RATE_WARNING_PERCENT {
        warnings.push(format!("Annual rate of {annual_rate_percent}% is unusually high"));
    }
    if term_periods > LONG_TERM_WARNING_YEARS.saturating_mul(periods_per_year) {
        warnings.push(format!(
            "Term exceeds {LONG_TERM_WARNING_YEARS} years; check the period count"
        ));
    }
}

fn has_extras(spec: &ScheduleSpec) -> bool {
    spec.extra_payment > Decimal::ZERO || spec.lump_sums.iter().any(|l| l.amount > Decimal::ZERO)
}

fn build_output(
    mode: LoanMode,
    spec: &ScheduleSpec,
    annual_rate_percent: Decimal,
    compounding_per_year: u32,
    warnings: &mut Vec<String>,
) -> CalcResult<LoanOutput> {
    let schedule = generate_schedule(spec)?;
    let totals = aggregate::totals(&schedule);
    let yearly = aggregate::yearly(&schedule);

    let (interest_saved, periods_saved) = if has_extras(spec) {
        // The regular payment alone may not amortise (payoff mode relies on
        // the extra), in which case there is nothing to compare against.
        match generate_schedule(&ScheduleSpec {
            extra_payment: Decimal::ZERO,
            lump_sums: Vec::new(),
            start_date: None,
            ..spec.clone()
        }) {
            Ok(baseline) => {
                let base_totals = aggregate::totals(&baseline);
                (
                    Some(base_totals.total_interest - totals.total_interest),
                    Some(
                        base_totals
                            .number_of_payments
                            .saturating_sub(totals.number_of_payments),
                    ),
                )
            }
            Err(e) => {
                warnings.push(format!("Savings not reported; without extra payments: {e}"));
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let summary = summarize(
        mode,
        spec,
        &schedule,
        &totals,
        rate::effective_annual_rate(annual_rate_percent, compounding_per_year)?,
        interest_saved,
        periods_saved,
    );

    Ok(LoanOutput {
        summary,
        schedule: schedule.rows,
        yearly,
    })
}

fn summarize(
    mode: LoanMode,
    spec: &ScheduleSpec,
    schedule: &Schedule,
    totals: &ScheduleTotals,
    effective_annual_rate: Rate,
    interest_saved: Option<Money>,
    periods_saved: Option<u32>,
) -> LoanSummary {
    LoanSummary {
        mode,
        periodic_payment: spec.payment,
        period_rate: spec.period_rate,
        effective_annual_rate,
        number_of_payments: totals.number_of_payments,
        total_interest: totals.total_interest,
        total_principal: totals.total_principal,
        total_extra_principal: totals.total_extra_principal,
        total_paid: totals.total_paid,
        payoff_date: schedule.payoff_date(),
        interest_saved,
        periods_saved,
    }
}
