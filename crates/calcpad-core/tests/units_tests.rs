#![cfg(all(feature = "units", feature = "health"))]

use calcpad_core::health::{calculate_bmi, BmiCategory, BmiInput, MeasurementSystem};
use calcpad_core::units::{self, Dimension, UnitConversionInput};
use calcpad_core::{within, CalcError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_every_linear_unit_round_trips_through_base() {
    for dim in [
        Dimension::Length,
        Dimension::Mass,
        Dimension::Volume,
        Dimension::Area,
        Dimension::Time,
        Dimension::Speed,
        Dimension::DataSize,
    ] {
        let defs = units::units_for(dim);
        let base = defs[0];
        for u in &defs {
            let there = units::convert(dec!(123.456), u.symbol, base.symbol).unwrap();
            let back = units::convert(there.result, base.symbol, u.symbol).unwrap();
            assert!(
                within(back.result, dec!(123.456), dec!(0.0000001)),
                "{} round trip gave {}",
                u.symbol,
                back.result
            );
        }
    }
}

#[test]
fn test_cup_to_millilitres() {
    let c = units::convert(dec!(2), "cups", "ml").unwrap();
    assert!(within(c.result, dec!(473.176473), dec!(0.000001)));
}

#[test]
fn test_miles_to_kilometres() {
    let c = units::convert(dec!(26.2), "mi", "km").unwrap();
    assert!(within(c.result, dec!(42.1648), dec!(0.0001)));
}

#[test]
fn test_speed_conversion() {
    let c = units::convert(dec!(100), "km/h", "mph").unwrap();
    assert!(within(c.result, dec!(62.1371), dec!(0.0001)));
}

#[test]
fn test_binary_and_decimal_data_sizes() {
    let c = units::convert(dec!(1), "GiB", "MB").unwrap();
    assert_eq!(c.result, dec!(1073.741824));
}

#[test]
fn test_convert_units_envelope() {
    let out = units::convert_units(&UnitConversionInput {
        value: dec!(98.6),
        from: "fahrenheit".into(),
        to: "celsius".into(),
    })
    .unwrap();
    assert_eq!(out.result.result, dec!(37));
    assert!(out.methodology.contains("temperature"));
    assert!(out.result.factor.is_none());
}

#[test]
fn test_dimension_mismatch_reports_symbols() {
    match units::convert(dec!(1), "cup", "kg") {
        Err(CalcError::IncompatibleUnits { from, to }) => {
            assert_eq!(from, "cup");
            assert_eq!(to, "kg");
        }
        other => panic!("expected IncompatibleUnits, got {other:?}"),
    }
}

#[test]
fn test_bmi_obese_imperial() {
    let out = calculate_bmi(&BmiInput {
        weight: dec!(250),
        height: dec!(68),
        system: MeasurementSystem::Imperial,
    })
    .unwrap();
    // 250 * 703 / 4624 ≈ 38.01
    assert!(within(out.result.bmi, dec!(38.01), dec!(0.01)));
    assert_eq!(out.result.category, BmiCategory::Obese);
}

#[test]
fn test_bmi_implausible_warns() {
    let out = calculate_bmi(&BmiInput {
        weight: dec!(70),
        height: dec!(1.75),
        system: MeasurementSystem::Metric,
    })
    .unwrap();
    assert!(out.result.bmi > Decimal::from(100));
    assert_eq!(out.warnings.len(), 1);
}
