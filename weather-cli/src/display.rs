//! Human-friendly rendering of lookup results and failures.

use std::fmt::Display;

use chrono::{DateTime, Local, Utc};
use weather_core::{ApiError, LocationIndex, Lookup, WeatherRecord};

/// One-line message for a failed geocoding request.
pub fn error_message(err: &ApiError) -> String {
    match err.status().map(|s| s.as_u16()) {
        Some(404) => "City not found. Please check the spelling.".to_string(),
        Some(401) => "Invalid API key. Please check your configuration.".to_string(),
        Some(_) => format!("API error: {err}"),
        None if err.is_network() => {
            "Network error. Please check your internet connection.".to_string()
        }
        None => format!("Unexpected error: {err}"),
    }
}

/// Text printed for a finished lookup of `city`.
pub fn render_lookup(city: &str, lookup: &Lookup) -> String {
    match lookup {
        Lookup::NoMatches => format!("No locations found for '{city}'."),
        Lookup::WeatherUnavailable { matches } => format!(
            "{}Weather data is currently unavailable. Please try again later.",
            selection(matches)
        ),
        Lookup::UnreadableWeather { matches } => format!(
            "{}The weather service returned data that could not be read.",
            selection(matches)
        ),
        Lookup::Found { matches, record } => {
            format!("{}{}", selection(matches), render_record(record))
        }
    }
}

/// Which candidate was used, plus any other names the geocoder returned.
fn selection(matches: &LocationIndex) -> String {
    let Some(chosen) = matches.first() else {
        return String::new();
    };

    let mut out = format!(
        "Using {} ({:.4}, {:.4})\n",
        chosen.label(),
        chosen.latitude,
        chosen.longitude
    );

    let others: Vec<&str> = matches.names().skip(1).collect();
    if !others.is_empty() {
        out.push_str(&format!("Other matches: {}\n", others.join(", ")));
    }
    out.push('\n');
    out
}

pub fn render_record(record: &WeatherRecord) -> String {
    let mut out = format!("Weather for {}\n", record.location);

    let lines = [
        ("Weather", format!("{} - {}", record.condition, record.description)),
        (
            "Temperature",
            format!(
                "{}, feels like {}",
                with_unit(record.temperature, "°C"),
                with_unit(record.feels_like, "°C")
            ),
        ),
        ("Max temperature", with_unit(record.temp_max, "°C")),
        ("Min temperature", with_unit(record.temp_min, "°C")),
        ("Pressure", with_unit(record.pressure, "hPa")),
        ("Humidity", with_unit(record.humidity, "%")),
        ("Visibility", with_unit(record.visibility, "m")),
        ("Wind speed", with_unit(record.wind_speed, "m/s")),
        ("Wind direction", with_unit(record.wind_direction, "deg")),
        ("Observed at", local_time(record.observed_at)),
        ("Sunrise", local_time(record.sunrise)),
        ("Sunset", local_time(record.sunset)),
    ];

    for (label, value) in lines {
        out.push_str(&format!("  {:<16} {value}\n", format!("{label}:")));
    }
    out
}

fn with_unit<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v} {unit}"),
        None => "n/a".to_string(),
    }
}

fn local_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}
