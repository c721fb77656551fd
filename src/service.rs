//! Astronomical data for one location and one calendar day.
//!
//! Snapshots come from the TTL cache when a live entry exists; otherwise the
//! provider is asked once, the raw fields are augmented with twilight and
//! lunar values, and the result is cached until the end of the current local
//! day.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::error::ServiceError;
use crate::lunar::{LunarInfo, LunarPhase, WaxWane};
use crate::metrics::Metrics;
use crate::provider::{AstronomyProvider, RawAstronomy};
use crate::twilight::compute_twilight;

const MS_PER_DAY: i64 = 86_400_000;

// ---------- SNAPSHOT ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstronomicalSnapshot {
    pub date: NaiveDate,
    pub current_time: String,
    pub sunrise: String,
    pub sunset: String,
    /// `None` when the moon does not rise on this day.
    pub moonrise: Option<String>,
    /// `None` when the moon does not set on this day.
    pub moonset: Option<String>,
    pub first_light: String,
    pub last_light: String,
    pub lunar_age_days: f64,
    pub lunar_illumination_percent: u8,
    pub lunar_wax_wane: WaxWane,
    pub lunar_phase: LunarPhase,
}

impl AstronomicalSnapshot {
    /// Adds the derived fields to a raw provider answer.
    pub fn augment(raw: &RawAstronomy, lunar: LunarInfo) -> Result<Self, ServiceError> {
        let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d")
            .map_err(|_| ServiceError::InvalidDate(raw.date.clone()))?;

        Ok(Self {
            date,
            current_time: raw.current_time.clone(),
            sunrise: raw.sunrise.clone(),
            sunset: raw.sunset.clone(),
            moonrise: raw.moonrise().map(str::to_string),
            moonset: raw.moonset().map(str::to_string),
            first_light: compute_twilight(&raw.sunrise, true),
            last_light: compute_twilight(&raw.sunset, false),
            lunar_age_days: lunar.age_days,
            lunar_illumination_percent: lunar.illumination_percent,
            lunar_wax_wane: lunar.wax_wane,
            lunar_phase: lunar.phase,
        })
    }
}

// ---------- QUERY ----------

#[derive(Debug, Clone)]
pub struct SnapshotQuery {
    pub lat: f64,
    pub lon: f64,
    pub api_key: String,
    pub time_zone: Tz,
    /// Today in `time_zone` when absent.
    pub date_override: Option<NaiveDate>,
}

impl SnapshotQuery {
    pub fn effective_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_override
            .unwrap_or_else(|| now.with_timezone(&self.time_zone).date_naive())
    }
}

pub fn cache_key(lat: f64, lon: f64, date: NaiveDate) -> String {
    format!("lat:{}-lon:{}-date:{}", lat, lon, date.format("%Y-%m-%d"))
}

// ---------- SERVICE ----------

pub struct AstronomicalDataService<'c, P> {
    provider: P,
    cache: &'c TtlCache,
    metrics: Arc<Metrics>,
}

impl<'c, P: AstronomyProvider> AstronomicalDataService<'c, P> {
    pub fn new(provider: P, cache: &'c TtlCache, metrics: Arc<Metrics>) -> Self {
        Self {
            provider,
            cache,
            metrics,
        }
    }

    /// Cached snapshot for the query's day, fetching it on a miss.
    ///
    /// A fetched entry lives until 23:59:59.999 of the current local day in
    /// `query.time_zone`. This also holds for `date_override`: a past or
    /// future date is cached until the end of today, not of that date.
    pub fn get_snapshot(&self, query: &SnapshotQuery) -> Result<AstronomicalSnapshot, ServiceError> {
        self.get_snapshot_at(query, Utc::now())
    }

    pub fn get_snapshot_at(
        &self,
        query: &SnapshotQuery,
        now: DateTime<Utc>,
    ) -> Result<AstronomicalSnapshot, ServiceError> {
        let tz = query.time_zone;
        let date = query.effective_date(now);
        let key = cache_key(query.lat, query.lon, date);

        if let Some(snapshot) = self.cache.get_at::<AstronomicalSnapshot>(&key, now.timestamp_millis()) {
            self.metrics.record_cache_hit();
            debug!(target: "dial_service", "Cache hit for {key}");
            return Ok(snapshot);
        }
        self.metrics.record_cache_miss();

        let start = Instant::now();
        let raw = self
            .provider
            .fetch(query.lat, query.lon, &query.api_key, date)
            .map_err(|source| ServiceError::Provider {
                key: key.clone(),
                source,
            })?;
        self.metrics.record_fetch(start.elapsed());

        let today = now.with_timezone(&tz).date_naive();
        let lunar = if date == today {
            LunarInfo::at(&now.with_timezone(&tz))
        } else {
            match local_instant(tz, date.and_time(NaiveTime::MIN)) {
                Some(midnight) => LunarInfo::at(&midnight),
                None => LunarInfo::at(&now.with_timezone(&tz)),
            }
        };

        let snapshot = AstronomicalSnapshot::augment(&raw, lunar)?;

        // an override date is kept until the end of today as well
        let expires_at = end_of_day_millis(tz, today).unwrap_or(now.timestamp_millis() + MS_PER_DAY);
        if let Err(e) = self.cache.set(&key, &snapshot, expires_at) {
            warn!(target: "dial_service", "Could not cache {key}: {e}");
        }

        info!(
            target: "dial_service",
            "Fetched {key}: sunrise {} sunset {} phase {}",
            snapshot.sunrise,
            snapshot.sunset,
            snapshot.lunar_phase
        );
        Ok(snapshot)
    }
}

/// Local wall-clock time resolved in `tz`. A time skipped by a DST jump
/// resolves one hour later.
fn local_instant(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
}

/// 23:59:59.999 of `date` in `tz`, as epoch milliseconds.
fn end_of_day_millis(tz: Tz, date: NaiveDate) -> Option<i64> {
    let last = date.and_hms_milli_opt(23, 59, 59, 999)?;
    tz.from_local_datetime(&last)
        .latest()
        .map(|at| at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::cell::Cell;

    struct FakeProvider {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                fail: true,
            }
        }
    }

    impl AstronomyProvider for FakeProvider {
        fn fetch(
            &self,
            _lat: f64,
            _lon: f64,
            _api_key: &str,
            date: NaiveDate,
        ) -> Result<RawAstronomy, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ProviderError::Status(503));
            }
            Ok(RawAstronomy {
                date: date.format("%Y-%m-%d").to_string(),
                current_time: "08:19:44.120".to_string(),
                sunrise: "06:20".to_string(),
                sunset: "19:04".to_string(),
                moonrise: "-:-".to_string(),
                moonset: "14:52".to_string(),
            })
        }
    }

    fn query(date_override: Option<NaiveDate>) -> SnapshotQuery {
        SnapshotQuery {
            lat: 40.7128,
            lon: -74.006,
            api_key: "test".to_string(),
            time_zone: chrono_tz::America::New_York,
            date_override,
        }
    }

    fn now() -> DateTime<Utc> {
        // 08:00 in New York
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_second_request_is_served_from_cache() {
        let cache = TtlCache::in_memory();
        let metrics = Arc::new(Metrics::new());
        let service = AstronomicalDataService::new(FakeProvider::new(), &cache, metrics.clone());

        let first = service.get_snapshot_at(&query(None), now()).unwrap();
        let second = service.get_snapshot_at(&query(None), now()).unwrap();

        assert_eq!(first, second);
        assert_eq!(service.provider.calls.get(), 1);
        assert_eq!(metrics.cache_hits(), 1);
        assert_eq!(metrics.cache_misses(), 1);
    }

    #[test]
    fn test_derived_fields() {
        let cache = TtlCache::in_memory();
        let service = AstronomicalDataService::new(FakeProvider::new(), &cache, Arc::new(Metrics::new()));

        let snapshot = service.get_snapshot_at(&query(None), now()).unwrap();
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(snapshot.first_light, "04:44");
        assert_eq!(snapshot.last_light, "20:40");
        assert_eq!(snapshot.moonrise, None);
        assert_eq!(snapshot.moonset.as_deref(), Some("14:52"));
        assert!(snapshot.lunar_age_days >= 0.0);
        assert!(snapshot.lunar_illumination_percent <= 100);
    }

    #[test]
    fn test_entry_expires_at_local_end_of_day() {
        let cache = TtlCache::in_memory();
        let service = AstronomicalDataService::new(FakeProvider::new(), &cache, Arc::new(Metrics::new()));
        service.get_snapshot_at(&query(None), now()).unwrap();

        let key = cache_key(40.7128, -74.006, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(key, "lat:40.7128-lon:-74.006-date:2024-06-01");

        // 23:59:59.999 EDT is 03:59:59.999 UTC the next day
        let last_live = Utc.with_ymd_and_hms(2024, 6, 2, 3, 59, 59).unwrap().timestamp_millis() + 998;
        assert!(cache.get_at::<AstronomicalSnapshot>(&key, last_live).is_some());
        assert!(cache.get_at::<AstronomicalSnapshot>(&key, last_live + 1).is_none());
    }

    #[test]
    fn test_provider_failure_leaves_cache_untouched() {
        let cache = TtlCache::in_memory();
        let service = AstronomicalDataService::new(FakeProvider::failing(), &cache, Arc::new(Metrics::new()));

        let result = service.get_snapshot_at(&query(None), now());
        assert!(matches!(result, Err(ServiceError::Provider { .. })));
        assert!(cache.is_empty());

        // no negative caching: the next request asks again
        let _ = service.get_snapshot_at(&query(None), now());
        assert_eq!(service.provider.calls.get(), 2);
    }

    #[test]
    fn test_date_override_uses_its_own_key_and_local_midnight() {
        let cache = TtlCache::in_memory();
        let service = AstronomicalDataService::new(FakeProvider::new(), &cache, Arc::new(Metrics::new()));
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();

        service.get_snapshot_at(&query(None), now()).unwrap();
        let snapshot = service.get_snapshot_at(&query(Some(date)), now()).unwrap();

        assert_eq!(service.provider.calls.get(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(snapshot.date, date);

        let midnight = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 12, 25, 0, 0, 0)
            .unwrap();
        let expected = LunarInfo::at(&midnight);
        assert!((snapshot.lunar_age_days - expected.age_days).abs() < 1e-9);
        assert_eq!(snapshot.lunar_phase, expected.phase);
    }

    #[test]
    fn test_past_override_date_lives_until_end_of_today() {
        let cache = TtlCache::in_memory();
        let service = AstronomicalDataService::new(FakeProvider::new(), &cache, Arc::new(Metrics::new()));
        let past = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();

        service.get_snapshot_at(&query(Some(past)), now()).unwrap();
        let key = cache_key(40.7128, -74.006, past);

        // still served later today, although its own day ended long ago
        let evening = Utc.with_ymd_and_hms(2024, 6, 2, 3, 0, 0).unwrap();
        let snapshot = service.get_snapshot_at(&query(Some(past)), evening).unwrap();
        assert_eq!(snapshot.date, past);
        assert_eq!(service.provider.calls.get(), 1);

        // gone after 23:59:59.999 EDT on 2024-06-01
        let after = Utc.with_ymd_and_hms(2024, 6, 2, 4, 0, 0).unwrap().timestamp_millis();
        assert!(cache.get_at::<AstronomicalSnapshot>(&key, after).is_none());
    }

    #[test]
    fn test_unparseable_provider_date() {
        let raw = RawAstronomy {
            date: "June first".to_string(),
            current_time: "08:00".to_string(),
            sunrise: "06:00".to_string(),
            sunset: "18:00".to_string(),
            moonrise: "".to_string(),
            moonset: "".to_string(),
        };
        let result = AstronomicalSnapshot::augment(&raw, LunarInfo::from_age(1.0));
        assert!(matches!(result, Err(ServiceError::InvalidDate(_))));
    }
}
