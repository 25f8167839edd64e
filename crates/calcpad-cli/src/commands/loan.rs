use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcpad_core::loans::{
    self, LoanInput, LoanTerms, LumpSum, PayoffInput, TargetPayoffInput,
};
use calcpad_core::PaymentFrequency;

use crate::input;

/// Shared loan-term flags
#[derive(Args)]
pub struct TermArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Term in payment periods (overrides --years)
    #[arg(long)]
    pub periods: Option<u32>,

    /// Payment frequency (weekly, biweekly, semi-monthly, monthly, quarterly, semi-annual, annual)
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Interest compounding periods per year, when different from the payment frequency
    #[arg(long)]
    pub compounding: Option<u32>,
}

impl TermArgs {
    fn to_terms(&self) -> Result<LoanTerms, Box<dyn std::error::Error>> {
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let ppy = self.frequency.periods_per_year();
        let term_periods = match (self.periods, self.years) {
            (Some(n), _) => n,
            (None, Some(y)) => y
                .checked_mul(ppy)
                .ok_or("--years is too large for the payment frequency")?,
            (None, None) => return Err("--periods or --years is required (or provide --input)".into()),
        };
        Ok(LoanTerms {
            principal,
            annual_rate_percent: rate,
            term_periods,
            periods_per_year: ppy,
            compounding_per_year: self.compounding,
        })
    }
}

/// Parse `PERIOD:AMOUNT`, e.g. `12:5000`.
fn parse_lump_sum(s: &str) -> Result<LumpSum, String> {
    let (period, amount) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PERIOD:AMOUNT, got '{s}'"))?;
    Ok(LumpSum {
        period: period
            .trim()
            .parse()
            .map_err(|e| format!("bad period '{period}': {e}"))?,
        amount: amount
            .trim()
            .parse()
            .map_err(|e| format!("bad amount '{amount}': {e}"))?,
    })
}

/// Arguments for a fixed-term amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermArgs,

    /// Extra principal paid every period
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// One-off prepayment as PERIOD:AMOUNT (repeatable)
    #[arg(long = "lump-sum", value_parser = parse_lump_sum)]
    pub lump_sums: Vec<LumpSum>,

    /// Loan start date (YYYY-MM-DD); enables payment dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

fn loan_input(args: AmortizeArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Ok(LoanInput {
            terms: args.terms.to_terms()?,
            extra_payment: args.extra,
            lump_sums: args.lump_sums,
            start_date: args.start_date,
        })
    }
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input = loan_input(args)?;
    let result = loans::analyze_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the level payment of a fixed-term loan
#[derive(Args)]
pub struct LoanPaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermArgs,
}

pub fn run_loan_payment(args: LoanPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanInput {
            terms: args.terms.to_terms()?,
            extra_payment: None,
            lump_sums: Vec::new(),
            start_date: None,
        }
    };

    let result = loans::analyze_loan(&loan_input)?;
    let mut value = serde_json::to_value(result)?;
    // Summary only; the row-level schedule is what `amortize` is for.
    let summary = value["result"]["summary"].take();
    value["result"] = summary;
    Ok(value)
}

/// Arguments for paying a loan down with a given payment
#[derive(Args)]
pub struct PayoffArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 18.99)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Payment made every period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Payment frequency
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Interest compounding periods per year
    #[arg(long)]
    pub compounding: Option<u32>,

    /// Extra principal paid every period
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// One-off prepayment as PERIOD:AMOUNT (repeatable)
    #[arg(long = "lump-sum", value_parser = parse_lump_sum)]
    pub lump_sums: Vec<LumpSum>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input: PayoffInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PayoffInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            payment: args
                .payment
                .ok_or("--payment is required (or provide --input)")?,
            periods_per_year: args.frequency.periods_per_year(),
            compounding_per_year: args.compounding,
            extra_payment: args.extra,
            lump_sums: args.lump_sums,
            start_date: args.start_date,
        }
    };

    let result = loans::analyze_payoff(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for target-date payoff
#[derive(Args)]
pub struct TargetDateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermArgs,

    /// Target payoff, in payment periods
    #[arg(long)]
    pub target_periods: Option<u32>,

    /// Target payoff, in years (ignored when --target-periods is set)
    #[arg(long)]
    pub target_years: Option<u32>,

    /// Loan start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_target_date(args: TargetDateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let target_input: TargetPayoffInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let terms = args.terms.to_terms()?;
        let target_periods = match (args.target_periods, args.target_years) {
            (Some(n), _) => n,
            (None, Some(y)) => y
                .checked_mul(terms.periods_per_year)
                .ok_or("--target-years is too large for the payment frequency")?,
            (None, None) => {
                return Err("--target-periods or --target-years is required (or provide --input)".into())
            }
        };
        TargetPayoffInput {
            terms,
            target_periods,
            start_date: args.start_date,
        }
    };

    let result = loans::payoff_for_target(&target_input)?;
    Ok(serde_json::to_value(result)?)
}
