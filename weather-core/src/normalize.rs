//! Turns a raw OpenWeather "current weather" body into a [`WeatherRecord`].
//!
//! Missing fields never fail the conversion; they fall back to a default or
//! stay `None`. A field that is present with the wrong type is treated as a
//! broken response: it is logged and the whole record is dropped.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::model::{RawWeatherPayload, WeatherRecord};

const UNKNOWN: &str = "Unknown";
const NO_DESCRIPTION: &str = "No description";
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Error, PartialEq)]
enum ShapeError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("`{0}` should be an object")]
    ExpectedObject(&'static str),
    #[error("`{0}` should be a list")]
    ExpectedList(&'static str),
    #[error("`{0}` should be a string")]
    ExpectedString(&'static str),
    #[error("`{0}` should be a number")]
    ExpectedNumber(&'static str),
    #[error("`{0}` is out of range")]
    OutOfRange(&'static str),
}

/// Convert Kelvin to Celsius, rounded to two decimal places (ties to even).
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    ((kelvin - KELVIN_OFFSET) * 100.0).round_ties_even() / 100.0
}

/// Build a [`WeatherRecord`] from a provider payload, or `None` if the payload
/// is not an object or has an unexpected shape.
pub fn normalize(payload: &RawWeatherPayload) -> Option<WeatherRecord> {
    match extract(payload) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(error = %err, "could not parse weather data");
            None
        }
    }
}

fn extract(payload: &RawWeatherPayload) -> Result<WeatherRecord, ShapeError> {
    let root = payload.as_object().ok_or(ShapeError::NotAnObject)?;
    let empty = Map::new();

    let sys = object(root, "sys")?.unwrap_or(&empty);
    let main = object(root, "main")?.unwrap_or(&empty);
    let wind = object(root, "wind")?.unwrap_or(&empty);
    let summary = first_weather_entry(root)?.unwrap_or(&empty);

    let country = string(sys, "sys.country")?.unwrap_or(UNKNOWN);
    let location = match string(root, "name")? {
        Some(city) if city != UNKNOWN => format!("{city}, {country}"),
        _ => country.to_string(),
    };

    Ok(WeatherRecord {
        location,
        condition: string(summary, "weather[0].main")?.unwrap_or(UNKNOWN).to_string(),
        description: string(summary, "weather[0].description")?
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        temperature: number(main, "main.temp")?.map(kelvin_to_celsius),
        feels_like: number(main, "main.feels_like")?.map(kelvin_to_celsius),
        temp_min: number(main, "main.temp_min")?.map(kelvin_to_celsius),
        temp_max: number(main, "main.temp_max")?.map(kelvin_to_celsius),
        pressure: number(main, "main.pressure")?,
        humidity: number(main, "main.humidity")?,
        visibility: number(root, "visibility")?,
        wind_speed: number(wind, "wind.speed")?,
        wind_direction: number(wind, "wind.deg")?,
        observed_at: timestamp(root, "dt")?,
        sunrise: timestamp(sys, "sys.sunrise")?,
        sunset: timestamp(sys, "sys.sunset")?,
    })
}

/// Last segment of a dotted path is the key inside `map`.
fn lookup<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let key = path.rsplit(['.', ']']).next().unwrap_or(path);
    map.get(key).filter(|v| !v.is_null())
}

fn object<'a>(
    map: &'a Map<String, Value>,
    path: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ShapeError> {
    match map.get(path) {
        None => Ok(None),
        Some(v) => v
            .as_object()
            .map(Some)
            .ok_or(ShapeError::ExpectedObject(path)),
    }
}

fn first_weather_entry(
    root: &Map<String, Value>,
) -> Result<Option<&Map<String, Value>>, ShapeError> {
    match root.get("weather") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => match items.first() {
            None => Ok(None),
            Some(item) => item
                .as_object()
                .map(Some)
                .ok_or(ShapeError::ExpectedObject("weather[0]")),
        },
        Some(_) => Err(ShapeError::ExpectedList("weather")),
    }
}

fn string<'a>(
    map: &'a Map<String, Value>,
    path: &'static str,
) -> Result<Option<&'a str>, ShapeError> {
    lookup(map, path)
        .map(|v| v.as_str().ok_or(ShapeError::ExpectedString(path)))
        .transpose()
}

fn number(map: &Map<String, Value>, path: &'static str) -> Result<Option<f64>, ShapeError> {
    lookup(map, path)
        .map(|v| v.as_f64().ok_or(ShapeError::ExpectedNumber(path)))
        .transpose()
}

fn timestamp(
    map: &Map<String, Value>,
    path: &'static str,
) -> Result<Option<DateTime<Utc>>, ShapeError> {
    lookup(map, path)
        .map(|v| {
            let secs = v.as_i64().ok_or(ShapeError::ExpectedNumber(path))?;
            DateTime::from_timestamp(secs, 0).ok_or(ShapeError::OutOfRange(path))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(value: Value) -> Option<WeatherRecord> {
        normalize(&RawWeatherPayload::new(value))
    }

    #[test]
    fn converts_kelvin_with_two_decimals() {
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
        assert_eq!(kelvin_to_celsius(300.15), 27.0);
        assert_eq!(kelvin_to_celsius(0.0), -273.15);
        assert_eq!(kelvin_to_celsius(285.456), 12.31);
        assert_eq!(kelvin_to_celsius(263.0), -10.15);
    }

    #[test]
    fn exact_ties_round_to_even() {
        // 256.025 K is exactly -17.125 °C.
        assert_eq!(kelvin_to_celsius(256.025), -17.12);
        assert_eq!(kelvin_to_celsius(273.275), 0.12);
    }

    #[test]
    fn normalizes_krakow_payload() {
        let record = run(json!({
            "sys": {"country": "PL"},
            "name": "Krakow",
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "main": {"temp": 300.15, "pressure": 1013, "humidity": 40}
        }))
        .expect("payload should normalize");

        assert_eq!(record.location, "Krakow, PL");
        assert_eq!(record.condition, "Clear");
        assert_eq!(record.description, "clear sky");
        assert_eq!(record.temperature, Some(27.0));
        assert_eq!(record.pressure, Some(1013.0));
        assert_eq!(record.humidity, Some(40.0));
        assert_eq!(record.feels_like, None);
        assert_eq!(record.temp_min, None);
        assert_eq!(record.temp_max, None);
        assert_eq!(record.wind_speed, None);
        assert_eq!(record.wind_direction, None);
        assert_eq!(record.visibility, None);
    }

    #[test]
    fn empty_main_yields_defaults_and_absent_temperatures() {
        let record = run(json!({"main": {}})).expect("payload should normalize");

        assert_eq!(record.condition, "Unknown");
        assert_eq!(record.description, "No description");
        assert_eq!(record.location, "Unknown");
        assert!(record.temperature.is_none());
        assert!(record.feels_like.is_none());
        assert!(record.temp_min.is_none());
        assert!(record.temp_max.is_none());
        assert!(record.pressure.is_none());
        assert!(record.humidity.is_none());
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(run(json!(42)).is_none());
        assert!(run(json!([{"main": {}}])).is_none());
        assert!(run(json!("weather")).is_none());
        assert!(run(Value::Null).is_none());
    }

    #[test]
    fn location_falls_back_to_country() {
        let record = run(json!({"sys": {"country": "NO"}}))
            .expect("payload should normalize");
        assert_eq!(record.location, "NO");

        let record = run(json!({"name": "Oslo"}))
            .expect("payload should normalize");
        assert_eq!(record.location, "Oslo, Unknown");
    }

    #[test]
    fn reads_all_pass_through_fields() {
        let record = run(json!({
            "name": "Tromso",
            "sys": {"country": "NO", "sunrise": 1_700_000_000, "sunset": 1_700_020_000},
            "dt": 1_700_010_000,
            "weather": [
                {"main": "Snow", "description": "light snow"},
                {"main": "Mist", "description": "mist"}
            ],
            "main": {
                "temp": 268.15, "feels_like": 262.4, "temp_min": 267.0, "temp_max": 269.55,
                "pressure": 1002.5, "humidity": 93
            },
            "visibility": 4000,
            "wind": {"speed": 7.2, "deg": 250}
        }))
        .expect("payload should normalize");

        assert_eq!(record.condition, "Snow");
        assert_eq!(record.description, "light snow");
        assert_eq!(record.temperature, Some(-5.0));
        assert_eq!(record.feels_like, Some(-10.75));
        assert_eq!(record.temp_min, Some(-6.15));
        assert_eq!(record.temp_max, Some(-3.6));
        assert_eq!(record.pressure, Some(1002.5));
        assert_eq!(record.humidity, Some(93.0));
        assert_eq!(record.visibility, Some(4000.0));
        assert_eq!(record.wind_speed, Some(7.2));
        assert_eq!(record.wind_direction, Some(250.0));
        assert_eq!(
            record.observed_at.map(|t| t.timestamp()),
            Some(1_700_010_000)
        );
        assert_eq!(record.sunrise.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(record.sunset.map(|t| t.timestamp()), Some(1_700_020_000));
    }

    #[test]
    fn null_leaves_count_as_missing() {
        let record = run(json!({
            "name": null,
            "main": {"temp": null, "humidity": null},
            "weather": null
        }))
        .expect("payload should normalize");

        assert_eq!(record.location, "Unknown");
        assert_eq!(record.condition, "Unknown");
        assert!(record.temperature.is_none());
        assert!(record.humidity.is_none());
    }

    #[test]
    fn fractional_humidity_is_passed_through() {
        let record = run(json!({
            "name": "Krakow",
            "sys": {"country": "PL"},
            "main": {"temp": 300.15, "humidity": 40.0}
        }))
        .expect("payload should normalize");
        assert_eq!(record.temperature, Some(27.0));
        assert_eq!(record.humidity, Some(40.0));

        let record = run(json!({"main": {"humidity": 40.5}}))
            .expect("payload should normalize");
        assert_eq!(record.humidity, Some(40.5));
    }

    #[test]
    fn empty_weather_list_uses_defaults() {
        let record = run(json!({"weather": []})).expect("payload should normalize");
        assert_eq!(record.condition, "Unknown");
        assert_eq!(record.description, "No description");
    }

    #[test]
    fn structural_errors_yield_none() {
        assert!(run(json!({"main": []})).is_none());
        assert!(run(json!({"sys": "PL"})).is_none());
        assert!(run(json!({"wind": null})).is_none());
        assert!(run(json!({"weather": {"main": "Clear"}})).is_none());
        assert!(run(json!({"weather": ["Clear"]})).is_none());
        assert!(run(json!({"main": {"temp": "warm"}})).is_none());
        assert!(run(json!({"main": {"humidity": "40%"}})).is_none());
        assert!(run(json!({"weather": [{"main": 7}]})).is_none());
    }

    #[test]
    fn extract_reports_offending_field() {
        let err = extract(&RawWeatherPayload::new(json!({"main": {"temp": "warm"}})))
            .expect_err("temperature is not a number");
        assert_eq!(err, ShapeError::ExpectedNumber("main.temp"));
        assert!(err.to_string().contains("main.temp"));
    }
}
