use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::Schedule;
use crate::types::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub number_of_payments: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra_principal: Money,
    pub total_paid: Money,
}

/// One year's worth of rows collapsed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBucket {
    pub year: u32,
    pub payments: u32,
    pub interest: Money,
    pub principal: Money,
    pub total_paid: Money,
    /// Balance after the last row in the bucket.
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

pub fn totals(schedule: &Schedule) -> ScheduleTotals {
    let mut t = ScheduleTotals {
        number_of_payments: schedule.rows.len() as u32,
        total_interest: Decimal::ZERO,
        total_principal: Decimal::ZERO,
        total_extra_principal: Decimal::ZERO,
        total_paid: Decimal::ZERO,
    };
    for row in &schedule.rows {
        t.total_interest += row.interest_portion;
        t.total_principal += row.principal_portion;
        t.total_extra_principal += row.extra_principal;
        t.total_paid += row.payment_amount;
    }
    t
}

/// Roll rows up into `periods_per_year`-sized buckets. A trailing partial
/// year becomes its own bucket.
pub fn yearly(schedule: &Schedule) -> Vec<YearlyBucket> {
    let size = schedule.periods_per_year.max(1) as usize;

    schedule
        .rows
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| {
            let interest: Money = chunk.iter().map(|r| r.interest_portion).sum();
            let principal: Money = chunk.iter().map(|r| r.principal_portion).sum();
            let total_paid: Money = chunk.iter().map(|r| r.payment_amount).sum();
            // chunks() never yields an empty slice
            let last = &chunk[chunk.len() - 1];
            YearlyBucket {
                year: i as u32 + 1,
                payments: chunk.len() as u32,
                interest,
                principal,
                total_paid,
                ending_balance: last.remaining_balance,
                cumulative_interest: last.cumulative_interest,
            }
        })
        .collect()
}
