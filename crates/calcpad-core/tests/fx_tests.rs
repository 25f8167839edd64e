#![cfg(feature = "fx")]

use calcpad_core::fx::{
    convert_currency, FallbackRateProvider, ManualClock, RateCache, RateProvider, RateSnapshot,
    RateSource, StaticRateProvider,
};
use calcpad_core::{CalcError, CalcResult};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

struct Offline;

impl RateProvider for Offline {
    fn fetch(&self, _base: &str) -> CalcResult<RateSnapshot> {
        Err(CalcError::RateUnavailable("connection refused".into()))
    }
}

fn usd_rates() -> StaticRateProvider {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_string(), dec!(0.8));
    rates.insert("GBP".to_string(), dec!(0.5));
    StaticRateProvider::new(RateSnapshot::new(
        "USD",
        rates,
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    ))
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
}

#[test]
fn test_conversion_then_cache_hit() {
    let provider = usd_rates();
    let mut cache = RateCache::with_default_ttl(clock());

    let first = convert_currency(dec!(50), "USD", "EUR", &mut cache, &provider).unwrap();
    assert_eq!(first.converted, dec!(40));
    assert_eq!(first.source, RateSource::Live);

    let second = convert_currency(dec!(10), "usd", "gbp", &mut cache, &provider).unwrap();
    assert_eq!(second.converted, dec!(5));
    assert_eq!(second.source, RateSource::Cached);
}

#[test]
fn test_cache_keyed_by_base() {
    let provider = usd_rates();
    let mut cache = RateCache::with_default_ttl(clock());

    convert_currency(dec!(1), "USD", "EUR", &mut cache, &provider).unwrap();
    let from_gbp = convert_currency(dec!(1), "GBP", "EUR", &mut cache, &provider).unwrap();
    assert_eq!(from_gbp.source, RateSource::Live);
    assert_eq!(from_gbp.rate, dec!(1.6));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_entry_refreshes_after_ttl() {
    let provider = usd_rates();
    let mut cache = RateCache::new(clock(), Duration::minutes(30));

    convert_currency(dec!(1), "USD", "EUR", &mut cache, &provider).unwrap();
    cache.clock().advance(Duration::minutes(29));
    let hit = convert_currency(dec!(1), "USD", "EUR", &mut cache, &provider).unwrap();
    assert_eq!(hit.source, RateSource::Cached);

    cache.clock().advance(Duration::minutes(1));
    let refetched = convert_currency(dec!(1), "USD", "EUR", &mut cache, &provider).unwrap();
    assert_eq!(refetched.source, RateSource::Live);
}

#[test]
fn test_offline_provider_falls_back() {
    let mut cache = RateCache::with_default_ttl(clock());
    let out = convert_currency(dec!(100), "USD", "EUR", &mut cache, &Offline).unwrap();
    assert_eq!(out.source, RateSource::Fallback);

    let table = FallbackRateProvider::snapshot(Utc::now());
    assert_eq!(out.rate, table.rate_to("EUR").unwrap());
}

#[test]
fn test_offline_unknown_base_is_error() {
    let mut cache = RateCache::with_default_ttl(clock());
    let err = convert_currency(dec!(1), "XXX", "EUR", &mut cache, &Offline).unwrap_err();
    assert!(matches!(err, CalcError::UnknownUnit(_)));
}
