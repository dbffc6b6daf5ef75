use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{
    error::ApiError,
    model::{LocationIndex, RawWeatherPayload},
    retry::{RetryPolicy, execute_with_retry},
};

pub mod geocoding;
pub mod openweather;

pub use geocoding::GeocodingClient;
pub use openweather::OpenWeatherClient;

/// First stage: city name to candidate locations.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve_city(&self, city: &str) -> Result<LocationIndex, ApiError>;
}

/// Second stage: raw current conditions for the first candidate.
///
/// Failures are logged by the implementation and reported as `None`.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_raw_weather(&self, index: &LocationIndex) -> Option<RawWeatherPayload>;
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ApiError::Transport)
}

/// Replace each `{name}` placeholder in `template`.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |url, (name, value)| {
        url.replace(&format!("{{{name}}}"), value)
    })
}

/// GET `url` as JSON under `policy`; only a 4xx/5xx status is an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    policy: &RetryPolicy,
    url: &str,
) -> Result<T, ApiError> {
    let url = Url::parse(url).map_err(|e| ApiError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    execute_with_retry(policy, ApiError::is_retryable, || {
        get_json_once(http, url.clone())
    })
    .await
}

async fn get_json_once<T: DeserializeOwned>(http: &Client, url: Url) -> Result<T, ApiError> {
    debug!(
        host = url.host_str().unwrap_or_default(),
        path = url.path(),
        "sending request"
    );

    let res = http
        .get(url)
        .send()
        .await
        .map_err(ApiError::from_transport)?;

    let status = res.status();
    let body = res.text().await.map_err(ApiError::from_transport)?;

    if status.is_client_error() || status.is_server_error() {
        return Err(ApiError::Status {
            status,
            body: truncate_body(&body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
