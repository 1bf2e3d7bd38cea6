use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Number of forecast slices kept from a forecast response.
pub const FORECAST_SLICE_LIMIT: usize = 10;

/// Unit system sent to the provider and used for display suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    /// Kelvin; the provider's own default.
    Standard,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }

    /// Value of the `units` query parameter. `Standard` sends none.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            UnitSystem::Metric => Some("metric"),
            UnitSystem::Imperial => Some("imperial"),
            UnitSystem::Standard => None,
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial, UnitSystem::Standard]
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            "standard" | "k" | "kelvin" => Ok(UnitSystem::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial, standard."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    ByName(String),
    ByCoordinates(Coordinates),
}

impl LocationQuery {
    /// Build a name query, trimming surrounding whitespace.
    pub fn by_name(text: &str) -> Result<Self, WeatherError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::EmptyInput);
        }
        Ok(LocationQuery::ByName(trimmed.to_string()))
    }

    pub fn by_coordinates(lat: f64, lon: f64) -> Self {
        LocationQuery::ByCoordinates(Coordinates::new(lat, lon))
    }
}

/// Result of the current-conditions call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentObservation {
    pub name: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub icon: String,
    pub condition: String,
    /// Offset from UTC in seconds at the observed location.
    pub utc_offset_secs: i32,
    pub observed_at: DateTime<Utc>,
}

impl CurrentObservation {
    /// History label: "City" or "City, CC".
    pub fn label(&self) -> String {
        match self.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

/// One future-time entry of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSlice {
    pub at: DateTime<Utc>,
    pub temperature: f64,
    pub icon: String,
    pub condition: String,
}

/// Combined payload published when a sequence completes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentObservation,
    pub forecast: Vec<ForecastSlice>,
    /// Unit system the sequence was issued with.
    pub unit: UnitSystem,
}

/// Session state owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Ready(WeatherReport),
    Failed(WeatherError),
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            QueryState::Ready(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WeatherError> {
        match self {
            QueryState::Failed(err) => Some(err),
            _ => None,
        }
    }
}
