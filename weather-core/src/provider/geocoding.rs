use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::ApiError,
    model::{LocationCandidate, LocationIndex},
    retry::RetryPolicy,
};

use super::{Geocoder, build_http_client, fill_template, get_json};

/// Resolves city names through the OpenWeather direct geocoding API.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    api_key: String,
    url_template: String,
    retry: RetryPolicy,
    http: Client,
}

impl GeocodingClient {
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
            config.geocoding_url.clone(),
            config.retry.clone(),
            http,
        ))
    }

    fn request_url(&self, city: &str) -> String {
        let city: String = url::form_urlencoded::byte_serialize(city.trim().as_bytes())
            .collect();
        fill_template(
            &self.url_template,
            &[("City", city.as_str()), ("APIkey", self.api_key.as_str())],
        )
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    #[instrument(skip(self))]
    async fn resolve_city(&self, city: &str) -> Result<LocationIndex, ApiError> {
        let url = self.request_url(city);
        let candidates: Vec<LocationCandidate> = get_json(&self.http, &self.retry, &url).await?;

        let index: LocationIndex = candidates.into_iter().collect();
        debug!(matches = index.len(), "geocoding finished");

        Ok(index)
    }
}
