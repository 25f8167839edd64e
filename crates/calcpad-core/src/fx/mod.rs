//! Currency conversion backed by an explicit, caller-owned rate cache.

pub mod cache;
pub mod clock;
pub mod provider;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CalcResult;

pub use cache::{RateCache, RateSource, DEFAULT_TTL_MINUTES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::{FallbackRateProvider, RateProvider, RateSnapshot, StaticRateProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxConversion {
    pub amount: Money,
    pub from: String,
    pub to: String,
    pub rate: Decimal,
    pub converted: Money,
    pub source: RateSource,
    pub as_of: DateTime<Utc>,
}

/// Convert `amount` of `from` into `to` using rates quoted against `from`.
pub fn convert_currency<C: Clock>(
    amount: Money,
    from: &str,
    to: &str,
    cache: &mut RateCache<C>,
    provider: &dyn RateProvider,
) -> CalcResult<FxConversion> {
    if amount < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "amount".into(),
            reason: "Amount cannot be negative".into(),
        });
    }
    let from = provider::normalize_code(from);
    let to = provider::normalize_code(to);
    if from.is_empty() || to.is_empty() {
        return Err(CalcError::InvalidInput {
            field: "currency".into(),
            reason: "Currency codes are required".into(),
        });
    }

    let (snapshot, source) = cache.get_or_fetch(&from, provider)?;
    let rate = snapshot
        .rate_to(&to)
        .ok_or_else(|| CalcError::UnknownUnit(to.clone()))?;

    Ok(FxConversion {
        amount,
        converted: amount * rate,
        from,
        to,
        rate,
        source,
        as_of: snapshot.as_of,
    })
}

/// Rates supplied with the request instead of a live source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppliedRates {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxInput {
    pub amount: Money,
    pub from: String,
    pub to: String,
    /// Without supplied rates, the hardcoded table is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<SuppliedRates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_minutes: Option<i64>,
}

/// One-shot conversion for CLI and binding callers that do not keep a cache
/// between requests.
pub fn convert(input: &FxInput) -> CalcResult<ComputationOutput<FxConversion>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let ttl = Duration::try_minutes(input.ttl_minutes.unwrap_or(DEFAULT_TTL_MINUTES))
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| CalcError::InvalidInput {
            field: "ttl_minutes".into(),
            reason: "Cache TTL must be a positive number of minutes within range".into(),
        })?;
    let mut cache = RateCache::new(SystemClock, ttl);

    let conversion = match &input.rates {
        Some(supplied) => {
            let snapshot = RateSnapshot::new(
                &supplied.base,
                supplied.rates.clone(),
                supplied.as_of.unwrap_or_else(Utc::now),
            );
            let provider = StaticRateProvider::new(snapshot);
            convert_currency(input.amount, &input.from, &input.to, &mut cache, &provider)?
        }
        None => {
            warnings.push("No rates supplied; using built-in fallback table".into());
            let provider = FallbackRateProvider;
            let mut c =
                convert_currency(input.amount, &input.from, &input.to, &mut cache, &provider)?;
            c.source = RateSource::Fallback;
            c
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Spot conversion via base-currency rate table",
        input,
        warnings,
        elapsed,
        conversion,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn supplied() -> SuppliedRates {
        let mut rates = BTreeMap::new();
        rates.insert("EUR".to_string(), dec!(0.9));
        rates.insert("JPY".to_string(), dec!(150));
        SuppliedRates {
            base: "USD".into(),
            rates,
            as_of: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_direct_conversion() {
        let out = convert(&FxInput {
            amount: dec!(100),
            from: "usd".into(),
            to: "eur".into(),
            rates: Some(supplied()),
            ttl_minutes: None,
        })
        .unwrap();
        assert_eq!(out.result.converted, dec!(90));
        assert_eq!(out.result.source, RateSource::Live);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_cross_conversion_through_base() {
        let out = convert(&FxInput {
            amount: dec!(90),
            from: "EUR".into(),
            to: "JPY".into(),
            rates: Some(supplied()),
            ttl_minutes: None,
        })
        .unwrap();
        // 90 EUR = 100 USD = 15000 JPY
        assert!((out.result.converted - dec!(15000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_unknown_currency() {
        let err = convert(&FxInput {
            amount: dec!(1),
            from: "USD".into(),
            to: "XYZ".into(),
            rates: Some(supplied()),
            ttl_minutes: None,
        })
        .unwrap_err();
        assert!(matches!(err, CalcError::UnknownUnit(_)));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = convert(&FxInput {
            amount: dec!(-1),
            from: "USD".into(),
            to: "EUR".into(),
            rates: None,
            ttl_minutes: None,
        })
        .unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }));
    }

    #[test]
    fn test_without_rates_uses_fallback() {
        let out = convert(&FxInput {
            amount: dec!(10),
            from: "USD".into(),
            to: "GBP".into(),
            rates: None,
            ttl_minutes: None,
        })
        .unwrap();
        assert_eq!(out.result.source, RateSource::Fallback);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        for ttl in [i64::MAX, 0, -5] {
            let err = convert(&FxInput {
                amount: dec!(1),
                from: "USD".into(),
                to: "EUR".into(),
                rates: Some(supplied()),
                ttl_minutes: Some(ttl),
            })
            .unwrap_err();
            assert!(matches!(err, CalcError::InvalidInput { .. }), "ttl {ttl}");
        }
    }
}
