//! Where exchange rates come from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CalcError;
use crate::CalcResult;

/// Units of each quote currency per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    pub as_of: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(base: &str, rates: BTreeMap<String, Decimal>, as_of: DateTime<Utc>) -> Self {
        Self {
            base: normalize_code(base),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (normalize_code(&code), rate))
                .collect(),
            as_of,
        }
    }

    /// Rate from `base` into `code`; the base itself is always 1.
    pub fn rate_to(&self, code: &str) -> Option<Decimal> {
        let code = normalize_code(code);
        if code == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(&code).copied()
    }

    /// Re-express the snapshot against another currency it quotes.
    pub fn rebase(&self, new_base: &str) -> CalcResult<RateSnapshot> {
        let new_base = normalize_code(new_base);
        if new_base == self.base {
            return Ok(self.clone());
        }
        let pivot = self
            .rate_to(&new_base)
            .filter(|r| !r.is_zero())
            .ok_or_else(|| CalcError::UnknownUnit(new_base.clone()))?;

        let mut rates: BTreeMap<String, Decimal> = self
            .rates
            .iter()
            .filter(|(code, _)| **code != new_base)
            .map(|(code, rate)| (code.clone(), rate / pivot))
            .collect();
        rates.insert(self.base.clone(), Decimal::ONE / pivot);

        Ok(RateSnapshot {
            base: new_base,
            rates,
            as_of: self.as_of,
        })
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub trait RateProvider {
    /// Latest rates quoted against `base`.
    fn fetch(&self, base: &str) -> CalcResult<RateSnapshot>;
}

/// Serves a fixed snapshot, e.g. one loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    snapshot: RateSnapshot,
}

impl StaticRateProvider {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self { snapshot }
    }
}

impl RateProvider for StaticRateProvider {
    fn fetch(&self, base: &str) -> CalcResult<RateSnapshot> {
        self.snapshot.rebase(base)
    }
}

/// Hardcoded USD-based table used when no live source answers.
const FALLBACK_USD_RATES: &[(&str, Decimal)] = &[
    ("AUD", dec!(1.52)),
    ("BRL", dec!(5.05)),
    ("CAD", dec!(1.36)),
    ("CHF", dec!(0.88)),
    ("CNY", dec!(7.24)),
    ("EUR", dec!(0.92)),
    ("GBP", dec!(0.79)),
    ("HKD", dec!(7.82)),
    ("INR", dec!(83.2)),
    ("JPY", dec!(151.5)),
    ("KRW", dec!(1350)),
    ("MXN", dec!(17.1)),
    ("NOK", dec!(10.7)),
    ("NZD", dec!(1.65)),
    ("SEK", dec!(10.6)),
    ("SGD", dec!(1.35)),
    ("ZAR", dec!(18.7)),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRateProvider;

impl FallbackRateProvider {
    pub fn snapshot(as_of: DateTime<Utc>) -> RateSnapshot {
        let rates = FALLBACK_USD_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        RateSnapshot::new("USD", rates, as_of)
    }
}

impl RateProvider for FallbackRateProvider {
    fn fetch(&self, base: &str) -> CalcResult<RateSnapshot> {
        Self::snapshot(Utc::now()).rebase(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn eur_snapshot() -> RateSnapshot {
        let mut rates = BTreeMap::new();
        rates.insert("usd".to_string(), dec!(1.25));
        rates.insert("GBP".to_string(), dec!(0.5));
        RateSnapshot::new("eur", rates, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_codes_are_normalized() {
        let s = eur_snapshot();
        assert_eq!(s.base, "EUR");
        assert_eq!(s.rate_to("usd"), Some(dec!(1.25)));
        assert_eq!(s.rate_to("eur"), Some(Decimal::ONE));
    }

    #[test]
    fn test_rebase() {
        let s = eur_snapshot().rebase("GBP").unwrap();
        assert_eq!(s.base, "GBP");
        assert_eq!(s.rate_to("EUR"), Some(dec!(2)));
        assert_eq!(s.rate_to("USD"), Some(dec!(2.5)));
        assert!(!s.rates.contains_key("GBP"));
    }

    #[test]
    fn test_rebase_unknown_currency() {
        assert!(matches!(
            eur_snapshot().rebase("XYZ"),
            Err(CalcError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_fallback_covers_majors() {
        let s = FallbackRateProvider.fetch("EUR").unwrap();
        assert!(s.rate_to("USD").is_some());
        assert!(s.rate_to("JPY").is_some());
    }
}
