//! Table-driven unit conversion.
//!
//! Every linear unit carries its multiplier to the base unit of its dimension
//! (metre, kilogram, litre, square metre, second, metre/second, byte).
//! Temperature is affine and goes through Celsius instead.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CalcResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Length,
    Mass,
    Volume,
    Area,
    Time,
    Speed,
    DataSize,
    Temperature,
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "length" | "distance" => Ok(Dimension::Length),
            "mass" | "weight" => Ok(Dimension::Mass),
            "volume" | "cooking" => Ok(Dimension::Volume),
            "area" => Ok(Dimension::Area),
            "time" => Ok(Dimension::Time),
            "speed" => Ok(Dimension::Speed),
            "datasize" | "data" => Ok(Dimension::DataSize),
            "temperature" | "temp" => Ok(Dimension::Temperature),
            other => Err(format!("unknown dimension '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Multiplier to the dimension's base unit.
    Factor(Decimal),
    Celsius,
    Fahrenheit,
    Kelvin,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitDef {
    pub symbol: &'static str,
    pub name: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub dimension: Dimension,
    #[serde(skip)]
    pub scale: Scale,
}

const fn linear(
    symbol: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    factor: Decimal,
) -> UnitDef {
    UnitDef {
        symbol,
        name,
        aliases,
        dimension,
        scale: Scale::Factor(factor),
    }
}

use Dimension::*;

static UNITS: &[UnitDef] = &[
    // Length (metre)
    linear("mm", "millimetre", &["millimeter", "millimeters", "millimetres"], Length, dec!(0.001)),
    linear("cm", "centimetre", &["centimeter", "centimeters", "centimetres"], Length, dec!(0.01)),
    linear("m", "metre", &["meter", "meters", "metres"], Length, dec!(1)),
    linear("km", "kilometre", &["kilometer", "kilometers", "kilometres"], Length, dec!(1000)),
    linear("in", "inch", &["inches", "\""], Length, dec!(0.0254)),
    linear("ft", "foot", &["feet", "'"], Length, dec!(0.3048)),
    linear("yd", "yard", &["yards"], Length, dec!(0.9144)),
    linear("mi", "mile", &["miles"], Length, dec!(1609.344)),
    linear("nmi", "nautical mile", &["nautical miles"], Length, dec!(1852)),
    // Mass (kilogram)
    linear("mg", "milligram", &["milligrams"], Mass, dec!(0.000001)),
    linear("g", "gram", &["grams"], Mass, dec!(0.001)),
    linear("kg", "kilogram", &["kilograms", "kilo", "kilos"], Mass, dec!(1)),
    linear("t", "tonne", &["tonnes", "metric ton", "metric tons"], Mass, dec!(1000)),
    linear("oz", "ounce", &["ounces"], Mass, dec!(0.028349523125)),
    linear("lb", "pound", &["pounds", "lbs"], Mass, dec!(0.45359237)),
    linear("st", "stone", &["stones"], Mass, dec!(6.35029318)),
    linear("ton", "short ton", &["short tons", "us ton"], Mass, dec!(907.18474)),
    // Volume (litre), US customary cooking measures
    linear("ml", "millilitre", &["milliliter", "milliliters", "millilitres"], Volume, dec!(0.001)),
    linear("l", "litre", &["liter", "liters", "litres"], Volume, dec!(1)),
    linear("m3", "cubic metre", &["cubic meter", "cubic meters"], Volume, dec!(1000)),
    linear("tsp", "teaspoon", &["teaspoons"], Volume, dec!(0.00492892159375)),
    linear("tbsp", "tablespoon", &["tablespoons"], Volume, dec!(0.01478676478125)),
    linear("floz", "fluid ounce", &["fl oz", "fluid ounces"], Volume, dec!(0.0295735295625)),
    linear("cup", "cup", &["cups"], Volume, dec!(0.2365882365)),
    linear("pt", "pint", &["pints"], Volume, dec!(0.473176473)),
    linear("qt", "quart", &["quarts"], Volume, dec!(0.946352946)),
    linear("gal", "gallon", &["gallons", "us gallon"], Volume, dec!(3.785411784)),
    linear("impgal", "imperial gallon", &["imperial gallons", "uk gallon"], Volume, dec!(4.54609)),
    // Area (square metre)
    linear("cm2", "square centimetre", &["square centimeter", "sq cm"], Area, dec!(0.0001)),
    linear("m2", "square metre", &["square meter", "sq m"], Area, dec!(1)),
    linear("km2", "square kilometre", &["square kilometer", "sq km"], Area, dec!(1000000)),
    linear("ha", "hectare", &["hectares"], Area, dec!(10000)),
    linear("in2", "square inch", &["sq in"], Area, dec!(0.00064516)),
    linear("ft2", "square foot", &["sq ft", "square feet"], Area, dec!(0.09290304)),
    linear("yd2", "square yard", &["sq yd"], Area, dec!(0.83612736)),
    linear("ac", "acre", &["acres"], Area, dec!(4046.8564224)),
    linear("mi2", "square mile", &["sq mi"], Area, dec!(2589988.110336)),
    // Time (second)
    linear("ms", "millisecond", &["milliseconds"], Time, dec!(0.001)),
    linear("s", "second", &["seconds", "sec"], Time, dec!(1)),
    linear("min", "minute", &["minutes"], Time, dec!(60)),
    linear("h", "hour", &["hours", "hr"], Time, dec!(3600)),
    linear("d", "day", &["days"], Time, dec!(86400)),
    linear("wk", "week", &["weeks"], Time, dec!(604800)),
    linear("yr", "year", &["years", "julian year"], Time, dec!(31557600)),
    // Speed (metre per second)
    linear("m/s", "metre per second", &["meters per second", "mps"], Speed, dec!(1)),
    linear("km/h", "kilometre per hour", &["kph", "kmh", "kilometers per hour"], Speed, dec!(0.2777777777777777777777777778)),
    linear("mph", "mile per hour", &["miles per hour"], Speed, dec!(0.44704)),
    linear("kn", "knot", &["knots", "kt"], Speed, dec!(0.5144444444444444444444444444)),
    linear("ft/s", "foot per second", &["fps", "feet per second"], Speed, dec!(0.3048)),
    // Data size (byte)
    linear("bit", "bit", &["bits"], DataSize, dec!(0.125)),
    linear("B", "byte", &["bytes"], DataSize, dec!(1)),
    linear("KB", "kilobyte", &["kilobytes"], DataSize, dec!(1000)),
    linear("MB", "megabyte", &["megabytes"], DataSize, dec!(1000000)),
    linear("GB", "gigabyte", &["gigabytes"], DataSize, dec!(1000000000)),
    linear("TB", "terabyte", &["terabytes"], DataSize, dec!(1000000000000)),
    linear("KiB", "kibibyte", &["kibibytes"], DataSize, dec!(1024)),
    linear("MiB", "mebibyte", &["mebibytes"], DataSize, dec!(1048576)),
    linear("GiB", "gibibyte", &["gibibytes"], DataSize, dec!(1073741824)),
    // Temperature
    UnitDef {
        symbol: "C",
        name: "celsius",
        aliases: &["°c", "degc", "centigrade"],
        dimension: Temperature,
        scale: Scale::Celsius,
    },
    UnitDef {
        symbol: "F",
        name: "fahrenheit",
        aliases: &["°f", "degf"],
        dimension: Temperature,
        scale: Scale::Fahrenheit,
    },
    UnitDef {
        symbol: "K",
        name: "kelvin",
        aliases: &["kelvins"],
        dimension: Temperature,
        scale: Scale::Kelvin,
    },
];

const KELVIN_OFFSET: Decimal = dec!(273.15);

/// Look a unit up by symbol, name or alias, ignoring case and surrounding
/// whitespace.
pub fn find_unit(name: &str) -> CalcResult<&'static UnitDef> {
    let needle = name.trim().to_lowercase();
    UNITS
        .iter()
        .find(|u| {
            u.symbol.to_lowercase() == needle
                || u.name == needle
                || u.aliases.iter().any(|a| *a == needle)
        })
        .ok_or_else(|| CalcError::UnknownUnit(name.trim().to_string()))
}

pub fn units_for(dimension: Dimension) -> Vec<&'static UnitDef> {
    UNITS.iter().filter(|u| u.dimension == dimension).collect()
}

pub fn all_units() -> &'static [UnitDef] {
    UNITS
}

fn to_celsius(scale: Scale, value: Decimal) -> Decimal {
    match scale {
        Scale::Fahrenheit => (value - dec!(32)) * dec!(5) / dec!(9),
        Scale::Kelvin => value - KELVIN_OFFSET,
        _ => value,
    }
}

fn from_celsius(scale: Scale, celsius: Decimal) -> Decimal {
    match scale {
        Scale::Fahrenheit => celsius * dec!(9) / dec!(5) + dec!(32),
        Scale::Kelvin => celsius + KELVIN_OFFSET,
        _ => celsius,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversion {
    pub value: Decimal,
    pub from: String,
    pub to: String,
    pub dimension: Dimension,
    pub result: Decimal,
    /// Multiplier applied, for linear units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<Decimal>,
}

pub fn convert(value: Decimal, from: &str, to: &str) -> CalcResult<UnitConversion> {
    let src = find_unit(from)?;
    let dst = find_unit(to)?;

    if src.dimension != dst.dimension {
        return Err(CalcError::IncompatibleUnits {
            from: src.symbol.to_string(),
            to: dst.symbol.to_string(),
        });
    }

    let (result, factor) = match (src.scale, dst.scale) {
        (Scale::Factor(a), Scale::Factor(b)) => {
            if value < Decimal::ZERO {
                return Err(CalcError::InvalidInput {
                    field: "value".into(),
                    reason: format!("{} cannot be negative", src.name),
                });
            }
            let factor = a / b;
            (value * factor, Some(factor))
        }
        (from_scale, to_scale) => {
            let celsius = to_celsius(from_scale, value);
            if celsius < -KELVIN_OFFSET {
                return Err(CalcError::InvalidInput {
                    field: "value".into(),
                    reason: "Temperature is below absolute zero".into(),
                });
            }
            (from_celsius(to_scale, celsius), None)
        }
    };

    Ok(UnitConversion {
        value,
        from: src.symbol.to_string(),
        to: dst.symbol.to_string(),
        dimension: src.dimension,
        result,
        factor,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversionInput {
    pub value: Decimal,
    pub from: String,
    pub to: String,
}

pub fn convert_units(input: &UnitConversionInput) -> CalcResult<ComputationOutput<UnitConversion>> {
    let start = Instant::now();
    let conversion = convert(input.value, &input.from, &input.to)?;
    let methodology = match conversion.dimension {
        Dimension::Temperature => "Affine temperature conversion via Celsius",
        _ => "Linear conversion via base-unit factor table",
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, Vec::new(), elapsed, conversion))
}
