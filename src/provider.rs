use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ProviderError;

/// Value the provider uses for "no such event today".
pub const NO_EVENT: &str = "-:-";

pub const IPGEOLOCATION_URL: &str = "https://api.ipgeolocation.io/astronomy";

/// Fields consumed from the provider, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAstronomy {
    pub date: String,
    pub current_time: String,
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
}

impl RawAstronomy {
    pub fn moonrise(&self) -> Option<&str> {
        event_time(&self.moonrise)
    }

    pub fn moonset(&self) -> Option<&str> {
        event_time(&self.moonset)
    }
}

fn event_time(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() || raw == NO_EVENT {
        None
    } else {
        Some(raw)
    }
}

pub trait AstronomyProvider {
    fn fetch(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
        date: NaiveDate,
    ) -> Result<RawAstronomy, ProviderError>;
}

impl<P: AstronomyProvider + ?Sized> AstronomyProvider for &P {
    fn fetch(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
        date: NaiveDate,
    ) -> Result<RawAstronomy, ProviderError> {
        (**self).fetch(lat, lon, api_key, date)
    }
}

// ---------- IPGEOLOCATION ----------

/// Astronomy endpoint of ipgeolocation.io over blocking HTTP.
pub struct IpGeolocationProvider {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl IpGeolocationProvider {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(IPGEOLOCATION_URL, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("sun_moon_dial/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

}

impl AstronomyProvider for IpGeolocationProvider {
    fn fetch(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
        date: NaiveDate,
    ) -> Result<RawAstronomy, ProviderError> {
        let start = Instant::now();
        debug!(target: "dial_provider", "GET {} lat={lat} lon={lon} date={date}", self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apiKey", api_key.to_string()),
                ("lat", lat.to_string()),
                ("long", lon.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text()?;
        if body.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        let raw: RawAstronomy = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Other(format!("malformed response: {e}")))?;

        info!(
            target: "dial_provider",
            "Fetched astronomy for {} in {}ms",
            raw.date,
            start.elapsed().as_millis()
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawAstronomy {
        serde_json::from_str(
            r#"{
                "location": {"latitude": "40.71", "longitude": "-74.00"},
                "date": "2024-06-01",
                "current_time": "08:19:44.120",
                "sunrise": "05:26",
                "sunset": "20:23",
                "solar_noon": "12:54",
                "moonrise": "-:-",
                "moonset": "14:52"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_response_parsing_ignores_extra_fields() {
        let raw = sample();
        assert_eq!(raw.date, "2024-06-01");
        assert_eq!(raw.current_time, "08:19:44.120");
        assert_eq!(raw.sunset, "20:23");
    }

    #[test]
    fn test_no_event_sentinel() {
        let raw = sample();
        assert_eq!(raw.moonrise(), None);
        assert_eq!(raw.moonset(), Some("14:52"));
        assert_eq!(event_time("  "), None);
    }

    #[test]
    fn test_unreachable_provider_is_a_request_error() {
        let provider = IpGeolocationProvider::with_base_url(
            "http://127.0.0.1:9/astronomy/",
            Duration::from_millis(200),
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 12).unwrap();
        let result = provider.fetch(41.8, -71.4, "key", date);
        assert!(matches!(result, Err(ProviderError::Request(_))));
    }
}
