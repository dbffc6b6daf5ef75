use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl LocationCandidate {
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// "Krakow, Lesser Poland, PL" style label; missing parts are skipped.
    pub fn label(&self) -> String {
        [
            Some(self.name.as_str()),
            self.state.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Geocoding matches keyed by place name.
///
/// A repeated name replaces the earlier candidate but keeps its position, so
/// [`LocationIndex::first`] is always the earliest name the provider returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationIndex {
    entries: Vec<LocationCandidate>,
}

impl LocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, candidate: LocationCandidate) {
        match self.entries.iter_mut().find(|c| c.name == candidate.name) {
            Some(existing) => *existing = candidate,
            None => self.entries.push(candidate),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LocationCandidate> {
        self.entries.iter().find(|c| c.name == name)
    }

    pub fn first(&self) -> Option<&LocationCandidate> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationCandidate> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.name.as_str())
    }
}

impl FromIterator<LocationCandidate> for LocationIndex {
    fn from_iter<I: IntoIterator<Item = LocationCandidate>>(iter: I) -> Self {
        let mut index = Self::new();
        for candidate in iter {
            index.insert(candidate);
        }
        index
    }
}

/// Untrusted weather response body, read through optional lookups only.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeatherPayload(Value);

impl RawWeatherPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Top-level object, or `None` when the body is not a JSON object.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }
}

impl From<Value> for RawWeatherPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Current conditions in display-ready units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub condition: String,
    pub description: String,
    /// Celsius.
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    /// hPa.
    pub pressure: Option<f64>,
    /// Percent.
    pub humidity: Option<f64>,
    /// Meters.
    pub visibility: Option<f64>,
    /// m/s.
    pub wind_speed: Option<f64>,
    /// Degrees.
    pub wind_direction: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}
