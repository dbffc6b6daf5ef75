//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and current-weather API clients sharing one retry policy
//! - Normalization of the weather response into a stable record
//! - The lookup pipeline chaining those stages
//!
//! It is used by `cityweather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod retry;
pub mod service;

pub use config::Config;
pub use error::ApiError;
pub use model::{LocationCandidate, LocationIndex, RawWeatherPayload, WeatherRecord};
pub use normalize::{kelvin_to_celsius, normalize};
pub use provider::{Geocoder, GeocodingClient, OpenWeatherClient, WeatherSource};
pub use reqwest::StatusCode;
pub use retry::{RetryPolicy, execute_with_retry};
pub use service::{Lookup, WeatherService};
