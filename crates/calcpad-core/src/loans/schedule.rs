//! Period-by-period amortisation ledger.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LumpSum, BALANCE_EPSILON};
use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// One period of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub period_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub payment_amount: Money,
    pub interest_portion: Money,
    /// Includes `extra_principal`.
    pub principal_portion: Money,
    pub extra_principal: Money,
    pub remaining_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<PaymentRow>,
    pub periods_per_year: u32,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn final_balance(&self) -> Money {
        self.rows
            .last()
            .map(|r| r.remaining_balance)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.rows.last().and_then(|r| r.payment_date)
    }
}

/// Everything the generator needs for one run.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub principal: Money,
    pub period_rate: Rate,
    /// Regular payment per period.
    pub payment: Money,
    /// Recurring amount paid on top of `payment` every period.
    pub extra_payment: Money,
    pub lump_sums: Vec<LumpSum>,
    pub periods_per_year: u32,
    /// Contractual term. The row at this period clears whatever balance is
    /// left, so rounding residue lands in the final payment.
    pub term_periods: Option<u32>,
    pub max_periods: u32,
    /// Loan start; the first payment falls one period later.
    pub start_date: Option<NaiveDate>,
}

impl ScheduleSpec {
    fn lump_sum_at(&self, period: u32) -> Money {
        self.lump_sums
            .iter()
            .filter(|l| l.period == period)
            .map(|l| l.amount)
            .sum()
    }
}

/// Date of payment `period` (1-based) for a loan starting on `start`.
///
/// Frequencies that divide a year into whole months step by months; the rest
/// step by `365 / periods_per_year` days.
pub fn payment_date(start: NaiveDate, periods_per_year: u32, period: u32) -> Option<NaiveDate> {
    if periods_per_year == 0 {
        return None;
    }
    if 12 % periods_per_year == 0 {
        let step = 12 / periods_per_year;
        start.checked_add_months(Months::new(step * period))
    } else {
        let step = (365 / periods_per_year) as u64;
        start.checked_add_days(Days::new(step * period as u64))
    }
}

/// Run the amortisation state machine until the balance reaches zero.
///
/// Fails with [`CalcError::NonAmortizing`] as soon as a period's total payment
/// does not cover its interest, and with [`CalcError::IterationBound`] if the
/// balance is still open after `max_periods`.
pub fn generate_schedule(spec: &ScheduleSpec) -> CalcResult<Schedule> {
    if spec.principal < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    if spec.period_rate < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "period_rate".into(),
            reason: "Period rate cannot be negative".into(),
        });
    }
    if spec.payment < Decimal::ZERO || spec.extra_payment < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "payment".into(),
            reason: "Payments cannot be negative".into(),
        });
    }

    let mut rows = Vec::new();
    let mut balance = spec.principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;

    if balance <= BALANCE_EPSILON {
        return Ok(Schedule {
            rows,
            periods_per_year: spec.periods_per_year,
        });
    }

    for period in 1..=spec.max_periods {
        let interest = balance
            .checked_mul(spec.period_rate)
            .ok_or_else(|| CalcError::InvalidInput {
                field: "period_rate".into(),
                reason: format!("Interest at period {period} overflows decimal range"),
            })?;
        let extra = spec.extra_payment + spec.lump_sum_at(period);
        let scheduled = spec
            .payment
            .checked_add(extra)
            .ok_or_else(|| CalcError::InvalidInput {
                field: "payment".into(),
                reason: "Payment plus extras overflows decimal range".into(),
            })?;
        let is_final_term = spec.term_periods == Some(period);

        if scheduled <= interest && !is_final_term {
            return Err(CalcError::NonAmortizing {
                payment: scheduled,
                interest,
            });
        }

        let regular_principal = (spec.payment - interest).max(Decimal::ZERO).min(balance);
        let mut principal = (scheduled - interest).min(balance);
        let mut new_balance = balance - principal;

        if new_balance <= BALANCE_EPSILON || is_final_term {
            principal += new_balance;
            new_balance = Decimal::ZERO;
        }

        cumulative_interest += interest;
        cumulative_principal += principal;

        rows.push(PaymentRow {
            period_index: period,
            payment_date: spec
                .start_date
                .and_then(|d| payment_date(d, spec.periods_per_year, period)),
            payment_amount: interest + principal,
            interest_portion: interest,
            principal_portion: principal,
            extra_principal: (principal - regular_principal).max(Decimal::ZERO),
            remaining_balance: new_balance,
            cumulative_interest,
            cumulative_principal,
        });

        if new_balance.is_zero() {
            return Ok(Schedule {
                rows,
                periods_per_year: spec.periods_per_year,
            });
        }
        balance = new_balance;
    }

    log::warn!(
        "schedule still open after {} periods (balance {})",
        spec.max_periods,
        balance
    );
    Err(CalcError::IterationBound {
        max_periods: spec.max_periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spec(principal: Money, period_rate: Rate, payment: Money) -> ScheduleSpec {
        ScheduleSpec {
            principal,
            period_rate,
            payment,
            extra_payment: Decimal::ZERO,
            lump_sums: Vec::new(),
            periods_per_year: 12,
            term_periods: None,
            max_periods: 1200,
            start_date: None,
        }
    }

    #[test]
    fn test_final_payment_is_clamped() {
        // 1000 at 0%, 300/period -> 300, 300, 300, 100
        let s = generate_schedule(&spec(dec!(1000), dec!(0), dec!(300))).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.rows[3].payment_amount, dec!(100));
        assert_eq!(s.rows[3].principal_portion, dec!(100));
        assert_eq!(s.final_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_cumulative_columns() {
        let s = generate_schedule(&spec(dec!(1000), dec!(0.01), dec!(200))).unwrap();
        let mut interest = Decimal::ZERO;
        let mut principal = Decimal::ZERO;
        for row in &s.rows {
            interest += row.interest_portion;
            principal += row.principal_portion;
            assert_eq!(row.cumulative_interest, interest);
            assert_eq!(row.cumulative_principal, principal);
        }
        assert_eq!(principal, dec!(1000));
    }

    #[test]
    fn test_payment_below_interest_is_error() {
        let err = generate_schedule(&spec(dec!(1000), dec!(0.02), dec!(20))).unwrap_err();
        assert!(matches!(err, CalcError::NonAmortizing { .. }));
    }

    #[test]
    fn test_iteration_cap() {
        let mut s = spec(dec!(1000), dec!(0), dec!(1));
        s.max_periods = 12;
        let err = generate_schedule(&s).unwrap_err();
        assert!(matches!(err, CalcError::IterationBound { max_periods: 12 }));
    }

    #[test]
    fn test_zero_principal_has_no_rows() {
        let s = generate_schedule(&spec(dec!(0), dec!(0.01), dec!(0))).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.final_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_lump_sum_counts_as_extra_principal() {
        let mut s = spec(dec!(1000), dec!(0), dec!(100));
        s.lump_sums = vec![LumpSum {
            period: 2,
            amount: dec!(500),
        }];
        let sched = generate_schedule(&s).unwrap();
        assert_eq!(sched.rows[1].principal_portion, dec!(600));
        assert_eq!(sched.rows[1].extra_principal, dec!(500));
        // 1000 - 100 - 600 = 300 left -> three more periods
        assert_eq!(sched.len(), 5);
    }

    #[test]
    fn test_monthly_payment_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            payment_date(start, 12, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            payment_date(start, 4, 2),
            NaiveDate::from_ymd_opt(2024, 7, 31)
        );
    }

    #[test]
    fn test_biweekly_payment_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            payment_date(start, 26, 1),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_interest_overflow_is_error() {
        let err = generate_schedule(&spec(Decimal::MAX, dec!(2), dec!(1))).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }));
    }
}
