use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    error::ApiError,
    model::{LocationIndex, RawWeatherPayload},
    retry::RetryPolicy,
};

use super::{WeatherSource, build_http_client, fill_template, get_json};

/// Fetches current conditions from the OpenWeather `data/2.5/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    url_template: String,
    retry: RetryPolicy,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: String,
        url_template: String,
        retry: RetryPolicy,
        http: Client,
    ) -> Self {
        Self {
            api_key,
            url_template,
            retry,
            http,
        }
    }

    pub fn from_config(api_key: &str, config: &Config) -> Result<Self, ApiError> {
        let http = build_http_client(config.request_timeout())?;
        Ok(Self::new(
            api_key.to_owned(),
            config.weather_url.clone(),
            config.retry.clone(),
            http,
        ))
    }

    fn request_url(&self, latitude: f64, longitude: f64) -> String {
        let (lat, lon) = (latitude.to_string(), longitude.to_string());
        fill_template(
            &self.url_template,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("APIkey", self.api_key.as_str()),
            ],
        )
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[instrument(skip_all, fields(matches = index.len()))]
    async fn fetch_raw_weather(&self, index: &LocationIndex) -> Option<RawWeatherPayload> {
        let Some(city) = index.first() else {
            warn!("no location to fetch weather for");
            return None;
        };

        if !city.has_valid_coordinates() {
            warn!(
                lat = city.latitude,
                lon = city.longitude,
                "invalid coordinates, skipping weather request"
            );
            return None;
        }

        let url = self.request_url(city.latitude, city.longitude);
        match get_json::<Value>(&self.http, &self.retry, &url).await {
            Ok(body) => {
                info!(
                    city = %city.name,
                    country = city.country.as_deref().unwrap_or("Unknown"),
                    "weather data retrieved"
                );
                Some(RawWeatherPayload::new(body))
            }
            Err(err) => {
                warn!(city = %city.name, error = %err, "weather request failed");
                None
            }
        }
    }
}
