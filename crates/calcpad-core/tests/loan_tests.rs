use calcpad_core::loans::{
    self, aggregate, payment, rate, schedule, LoanInput, LoanMode, LoanTerms, LumpSum,
    PayoffInput, TargetPayoffInput,
};
use calcpad_core::{within, CalcError};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOL: Decimal = dec!(0.000001);

fn terms(principal: Decimal, rate: Decimal, n: u32) -> LoanTerms {
    LoanTerms {
        principal,
        annual_rate_percent: rate,
        term_periods: n,
        periods_per_year: 12,
        compounding_per_year: None,
    }
}

fn loan(principal: Decimal, rate: Decimal, n: u32) -> LoanInput {
    LoanInput {
        terms: terms(principal, rate, n),
        extra_payment: None,
        lump_sums: Vec::new(),
        start_date: None,
    }
}

fn payoff(principal: Decimal, rate: Decimal, payment: Decimal) -> PayoffInput {
    PayoffInput {
        principal,
        annual_rate_percent: rate,
        payment,
        periods_per_year: 12,
        compounding_per_year: None,
        extra_payment: None,
        lump_sums: Vec::new(),
        start_date: None,
    }
}

// ===========================================================================
// Schedule invariants
// ===========================================================================

#[test]
fn test_final_balance_and_principal_sum_across_loans() {
    let cases = [
        (dec!(20000), dec!(5), 60),
        (dec!(350000), dec!(6.75), 360),
        (dec!(1500), dec!(29.99), 12),
        (dec!(999.99), dec!(0.5), 7),
        (dec!(75000), dec!(3.1), 180),
    ];
    for (principal, r, n) in cases {
        let out = loans::analyze_loan(&loan(principal, r, n)).unwrap();
        let rows = &out.result.schedule;
        assert_eq!(rows.len() as u32, n);

        let last = rows.last().unwrap();
        assert!(within(last.remaining_balance, Decimal::ZERO, TOL));

        let principal_sum: Decimal = rows.iter().map(|r| r.principal_portion).sum();
        assert!(
            within(principal_sum, principal, TOL),
            "principal sum {principal_sum} != {principal}"
        );
    }
}

#[test]
fn test_rows_are_ordered_and_balance_never_negative() {
    let out = loans::analyze_loan(&loan(dec!(50000), dec!(7.5), 84)).unwrap();
    for (i, row) in out.result.schedule.iter().enumerate() {
        assert_eq!(row.period_index, i as u32 + 1);
        assert!(row.remaining_balance >= Decimal::ZERO);
        assert_eq!(row.payment_amount, row.interest_portion + row.principal_portion);
    }
}

#[test]
fn test_zero_rate_loan() {
    let out = loans::analyze_loan(&loan(dec!(12000), dec!(0), 48)).unwrap();
    assert_eq!(out.result.summary.periodic_payment, dec!(250));
    for row in &out.result.schedule {
        assert_eq!(row.interest_portion, Decimal::ZERO);
        assert_eq!(row.principal_portion, dec!(250));
    }
    assert_eq!(out.result.summary.total_interest, Decimal::ZERO);
}

#[test]
fn test_schedule_is_deterministic() {
    let input = loan(dec!(20000), dec!(5), 60);
    let a = loans::analyze_loan(&input).unwrap();
    let b = loans::analyze_loan(&input).unwrap();
    assert_eq!(a.result.schedule, b.result.schedule);
    assert_eq!(a.result.yearly, b.result.yearly);
}

#[test]
fn test_zero_principal_is_immediately_terminal() {
    let out = loans::analyze_loan(&loan(dec!(0), dec!(5), 60)).unwrap();
    assert!(out.result.schedule.is_empty());
    assert_eq!(out.result.summary.number_of_payments, 0);
}

// ===========================================================================
// Known answers
// ===========================================================================

#[test]
fn test_car_loan_known_answer() {
    let out = loans::analyze_loan(&loan(dec!(20000), dec!(5), 60)).unwrap();
    let s = &out.result.summary;
    assert!(within(s.period_rate, dec!(0.0041667), dec!(0.0000001)));
    assert!(within(s.periodic_payment, dec!(377.42), dec!(0.01)));

    let first = &out.result.schedule[0];
    assert!(within(first.interest_portion, dec!(83.33), dec!(0.01)));
    assert!(within(first.principal_portion, dec!(294.09), dec!(0.01)));

    // 60 * 377.4246 - 20000
    assert!(within(s.total_interest, dec!(2645.48), dec!(0.05)));
}

#[test]
fn test_credit_card_payoff_terminates() {
    let out = loans::analyze_payoff(&payoff(dec!(5000), dec!(18.99), dec!(200))).unwrap();
    let s = &out.result.summary;
    assert_eq!(s.mode, LoanMode::TargetPayment);
    assert!((30..=34).contains(&s.number_of_payments));
    assert!(s.total_interest > Decimal::ZERO);
    assert!(within(s.total_principal, dec!(5000), TOL));

    let last = out.result.schedule.last().unwrap();
    assert!(last.payment_amount <= dec!(200));
    assert_eq!(last.remaining_balance, Decimal::ZERO);
}

#[test]
fn test_credit_card_payment_below_interest() {
    let err = loans::analyze_payoff(&payoff(dec!(5000), dec!(18.99), dec!(50))).unwrap_err();
    match err {
        CalcError::NonAmortizing { payment, interest } => {
            assert_eq!(payment, dec!(50));
            assert!(within(interest, dec!(79.125), dec!(0.001)));
        }
        other => panic!("expected NonAmortizing, got {other:?}"),
    }
}

#[test]
fn test_error_messages_are_user_facing() {
    let err = loans::analyze_payoff(&payoff(dec!(5000), dec!(18.99), dec!(50))).unwrap_err();
    assert!(err.to_string().contains("too low to amortize"));

    let err = payment::periods_for_payment(dec!(1000), dec!(0.01), dec!(10.000001), 12).unwrap_err();
    assert!(err.to_string().contains("reasonable time"));
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_invalid_terms() {
    assert!(matches!(
        loans::analyze_loan(&loan(dec!(-1), dec!(5), 60)),
        Err(CalcError::InvalidInput { .. })
    ));
    assert!(matches!(
        loans::analyze_loan(&loan(dec!(1000), dec!(-5), 60)),
        Err(CalcError::InvalidInput { .. })
    ));
    assert!(matches!(
        loans::analyze_loan(&loan(dec!(1000), dec!(5), 0)),
        Err(CalcError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Extra payments and target payoff
// ===========================================================================

#[test]
fn test_extra_payment_saves_interest_and_time() {
    let mut input = loan(dec!(200000), dec!(6), 360);
    input.extra_payment = Some(dec!(200));
    let out = loans::analyze_loan(&input).unwrap();
    let s = &out.result.summary;

    assert!(s.number_of_payments < 360);
    assert!(s.interest_saved.unwrap() > dec!(50000));
    assert_eq!(s.periods_saved.unwrap(), 360 - s.number_of_payments);
    assert!(within(s.total_principal, dec!(200000), TOL));
    assert!(s.total_extra_principal > Decimal::ZERO);
}

#[test]
fn test_lump_sum_shortens_schedule() {
    let mut input = loan(dec!(10000), dec!(4), 36);
    input.lump_sums = vec![LumpSum {
        period: 12,
        amount: dec!(3000),
    }];
    let out = loans::analyze_loan(&input).unwrap();
    assert!(out.result.summary.number_of_payments < 36);
    assert!(within(out.result.schedule[11].extra_principal, dec!(3000), TOL));
}

#[test]
fn test_target_payoff_hits_target() {
    let input = TargetPayoffInput {
        terms: terms(dec!(200000), dec!(6), 360),
        target_periods: 180,
        start_date: None,
    };
    let out = loans::payoff_for_target(&input).unwrap();
    let r = &out.result;
    assert_eq!(r.summary.number_of_payments, 180);
    assert!(within(r.required_payment, dec!(1687.71), dec!(0.01)));
    assert!(within(
        r.required_payment,
        r.contractual_payment + r.extra_payment_needed,
        Decimal::ZERO
    ));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_target_beyond_term_needs_no_extra() {
    let input = TargetPayoffInput {
        terms: terms(dec!(10000), dec!(5), 24),
        target_periods: 36,
        start_date: None,
    };
    let out = loans::payoff_for_target(&input).unwrap();
    assert_eq!(out.result.extra_payment_needed, Decimal::ZERO);
    assert_eq!(out.result.summary.number_of_payments, 24);
    assert_eq!(out.warnings.len(), 1);
}

// ===========================================================================
// Aggregation, dates, compounding
// ===========================================================================

#[test]
fn test_yearly_buckets_sum_to_totals() {
    let out = loans::analyze_loan(&loan(dec!(30000), dec!(4.5), 66)).unwrap();
    let yearly = &out.result.yearly;
    assert_eq!(yearly.len(), 6);
    assert_eq!(yearly[5].payments, 6);

    let interest: Decimal = yearly.iter().map(|y| y.interest).sum();
    let principal: Decimal = yearly.iter().map(|y| y.principal).sum();
    assert!(within(interest, out.result.summary.total_interest, TOL));
    assert!(within(principal, out.result.summary.total_principal, TOL));
    assert_eq!(yearly[0].ending_balance, out.result.schedule[11].remaining_balance);
}

#[test]
fn test_payoff_date_from_start_date() {
    let mut input = loan(dec!(12000), dec!(0), 12);
    input.start_date = NaiveDate::from_ymd_opt(2025, 1, 15);
    let out = loans::analyze_loan(&input).unwrap();
    assert_eq!(
        out.result.schedule[0].payment_date,
        NaiveDate::from_ymd_opt(2025, 2, 15)
    );
    assert_eq!(
        out.result.summary.payoff_date,
        NaiveDate::from_ymd_opt(2026, 1, 15)
    );
}

#[test]
fn test_semi_annual_compounding_lowers_payment() {
    let monthly = loans::analyze_loan(&loan(dec!(300000), dec!(5), 300)).unwrap();
    let mut canadian = loan(dec!(300000), dec!(5), 300);
    canadian.terms.compounding_per_year = Some(2);
    let semi = loans::analyze_loan(&canadian).unwrap();

    assert!(semi.result.summary.periodic_payment < monthly.result.summary.periodic_payment);
    assert!(within(
        semi.result.summary.total_principal,
        dec!(300000),
        TOL
    ));
}

#[test]
fn test_generator_matches_solver_period_count() {
    let r = rate::period_rate(dec!(9), 12).unwrap();
    let pmt = dec!(450);
    let n = payment::periods_for_payment(dec!(20000), r, pmt, 12).unwrap();
    let sched = schedule::generate_schedule(&schedule::ScheduleSpec {
        principal: dec!(20000),
        period_rate: r,
        payment: pmt,
        extra_payment: Decimal::ZERO,
        lump_sums: Vec::new(),
        periods_per_year: 12,
        term_periods: None,
        max_periods: 1200,
        start_date: None,
    })
    .unwrap();
    assert_eq!(sched.len() as u32, n);
    assert_eq!(aggregate::totals(&sched).number_of_payments, n);
}

// ===========================================================================
// Payoff with extras and range limits
// ===========================================================================

#[test]
fn test_payoff_relying_on_extra_succeeds_without_savings() {
    // 50 a month is below the ~79 of monthly interest; only the extra amortises.
    let mut input = payoff(dec!(5000), dec!(18.99), dec!(50));
    input.extra_payment = Some(dec!(150));
    let out = loans::analyze_payoff(&input).unwrap();
    let s = &out.result.summary;

    assert!((30..=34).contains(&s.number_of_payments));
    assert_eq!(s.interest_saved, None);
    assert_eq!(s.periods_saved, None);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("Savings not reported")));
    assert_eq!(out.result.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
}

#[test]
fn test_payoff_with_extra_reports_savings() {
    let mut input = payoff(dec!(5000), dec!(18.99), dec!(200));
    input.extra_payment = Some(dec!(100));
    let out = loans::analyze_payoff(&input).unwrap();
    let s = &out.result.summary;

    assert!(s.interest_saved.unwrap() > Decimal::ZERO);
    assert!(s.periods_saved.unwrap() > 0);
    assert!(!out.warnings.iter().any(|w| w.contains("Savings not reported")));
}

#[test]
fn test_extreme_rate_amortizes() {
    let out = loans::analyze_loan(&loan(dec!(1000000), dec!(300), 250)).unwrap();
    let result = &out.result;

    assert_eq!(result.schedule.len(), 250);
    assert_eq!(result.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    assert!(result.summary.periodic_payment > dec!(250000));
    assert!(within(result.summary.total_principal, dec!(1000000), TOL));
}

#[test]
fn test_growth_beyond_decimal_range_is_error() {
    let err = loans::analyze_loan(&loan(dec!(1000), dec!(300), 1200)).unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { .. }));
}

#[test]
fn test_huge_periods_per_year_rejected() {
    let mut input = loan(dec!(10000), dec!(5), 60);
    input.terms.periods_per_year = 50_000_000;
    let err = loans::analyze_loan(&input).unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { .. }));

    let mut input = payoff(dec!(10000), dec!(5), dec!(500));
    input.periods_per_year = 50_000_000;
    let err = loans::analyze_payoff(&input).unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { .. }));

    let mut terms = terms(dec!(10000), dec!(5), 60);
    terms.periods_per_year = u32::MAX;
    let err = loans::payoff_for_target(&TargetPayoffInput {
        terms,
        target_periods: 12,
        start_date: None,
    })
    .unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { .. }));
}
