use anyhow::{Context, anyhow};
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::ApiError,
    model::{LocationIndex, WeatherRecord},
    normalize::normalize,
    provider::{Geocoder, GeocodingClient, OpenWeatherClient, WeatherSource},
};

/// How far a lookup got.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Geocoding returned no candidates.
    NoMatches,
    /// Candidates found, but no weather body could be fetched.
    WeatherUnavailable { matches: LocationIndex },
    /// A weather body arrived but could not be normalized.
    UnreadableWeather { matches: LocationIndex },
    Found {
        matches: LocationIndex,
        record: WeatherRecord,
    },
}

/// Geocode, fetch and normalize, one city at a time.
#[derive(Debug)]
pub struct WeatherService {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
}

impl WeatherService {
    pub fn new(geocoder: Box<dyn Geocoder>, weather: Box<dyn WeatherSource>) -> Self {
        Self { geocoder, weather }
    }

    /// Construct the OpenWeather-backed pipeline from a validated config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        // validate() has already rejected a missing key.
        let api_key = config
            .api_key()
            .ok_or_else(|| anyhow!("API key missing after validation"))?;

        let geocoder = GeocodingClient::from_config(api_key, config)
            .context("Failed to initialize geocoding client")?;
        let weather = OpenWeatherClient::from_config(api_key, config)
            .context("Failed to initialize weather client")?;

        Ok(Self::new(Box::new(geocoder), Box::new(weather)))
    }

    /// Geocoding failures are returned as `Err` so callers can branch on the
    /// status code; later stages only report how far they got.
    #[instrument(skip(self))]
    pub async fn lookup(&self, city: &str) -> Result<Lookup, ApiError> {
        let matches = self.geocoder.resolve_city(city).await?;
        if matches.is_empty() {
            debug!("no geocoding matches");
            return Ok(Lookup::NoMatches);
        }

        let Some(payload) = self.weather.fetch_raw_weather(&matches).await else {
            return Ok(Lookup::WeatherUnavailable { matches });
        };

        Ok(match normalize(&payload) {
            Some(record) => Lookup::Found { matches, record },
            None => Lookup::UnreadableWeather { matches },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationCandidate, RawWeatherPayload};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum StubGeocoder {
        Matches(Vec<(&'static str, f64, f64)>),
        Status(u16),
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn resolve_city(&self, _city: &str) -> Result<LocationIndex, ApiError> {
            match self {
                StubGeocoder::Matches(items) => Ok(items
                    .iter()
                    .map(|(name, lat, lon)| LocationCandidate {
                        name: name.to_string(),
                        country: Some("PL".into()),
                        state: None,
                        latitude: *lat,
                        longitude: *lon,
                    })
                    .collect()),
                StubGeocoder::Status(code) => Err(ApiError::Status {
                    status: StatusCode::from_u16(*code).expect("valid status"),
                    body: String::new(),
                }),
            }
        }
    }

    #[derive(Debug, Default)]
    struct StubWeather {
        payload: Option<serde_json::Value>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherSource for StubWeather {
        async fn fetch_raw_weather(&self, _index: &LocationIndex) -> Option<RawWeatherPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload.clone().map(RawWeatherPayload::new)
        }
    }

    fn service(geocoder: StubGeocoder, weather: StubWeather) -> WeatherService {
        WeatherService::new(Box::new(geocoder), Box::new(weather))
    }

    #[tokio::test]
    async fn found_when_every_stage_succeeds() {
        let svc = service(
            StubGeocoder::Matches(vec![("Krakow", 50.06, 19.94)]),
            StubWeather {
                payload: Some(json!({
                    "name": "Krakow",
                    "sys": {"country": "PL"},
                    "main": {"temp": 273.15}
                })),
                ..Default::default()
            },
        );

        match svc.lookup("Krakow").await.expect("lookup should succeed") {
            Lookup::Found { matches, record } => {
                assert_eq!(matches.len(), 1);
                assert_eq!(record.location, "Krakow, PL");
                assert_eq!(record.temperature, Some(0.0));
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn geocoding_status_errors_propagate() {
        let svc = service(StubGeocoder::Status(404), StubWeather::default());

        let err = svc.lookup("Atlantis").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn no_matches_skips_weather_stage() {
        let calls = Arc::new(AtomicUsize::new(0));
        let weather = StubWeather {
            payload: None,
            calls: Arc::clone(&calls),
        };
        let svc = service(StubGeocoder::Matches(vec![]), weather);

        assert_eq!(svc.lookup("Atlantis").await.expect("ok"), Lookup::NoMatches);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_payload_is_weather_unavailable() {
        let svc = service(
            StubGeocoder::Matches(vec![("Krakow", 50.06, 19.94)]),
            StubWeather::default(),
        );

        let outcome = svc.lookup("Krakow").await.expect("ok");
        assert!(matches!(outcome, Lookup::WeatherUnavailable { .. }), "got {outcome:?}");
    }

    #[tokio::test]
    async fn malformed_payload_is_unreadable() {
        let svc = service(
            StubGeocoder::Matches(vec![("Krakow", 50.06, 19.94)]),
            StubWeather {
                payload: Some(json!([1, 2, 3])),
                ..Default::default()
            },
        );

        let outcome = svc.lookup("Krakow").await.expect("ok");
        assert!(matches!(outcome, Lookup::UnreadableWeather { .. }), "got {outcome:?}");
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = WeatherService::from_config(&Config::default()).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `cityweather configure`"));
        assert!(!msg.contains("after validation"));
    }

    #[test]
    fn from_config_rejects_bad_template_before_building_clients() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.geocoding_url = "https://geo.test/direct?appid={APIkey}".into();

        let err = WeatherService::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("{City}"));
    }

    #[test]
    fn from_config_builds_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        assert!(WeatherService::from_config(&cfg).is_ok());
    }
}
