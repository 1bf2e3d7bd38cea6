use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Coordinates, CurrentObservation, ForecastSlice, LocationQuery, UnitSystem},
};

use super::WeatherProvider;

/// Where requests go and whether the client attaches the key itself.
#[derive(Clone)]
pub enum Endpoint {
    /// Straight to the provider; `appid` is added to every request.
    Direct { base_url: String, api_key: String },
    /// Through the relay; the key never leaves the server.
    Relay { base_url: String },
}

impl Endpoint {
    fn base_url(&self) -> &str {
        match self {
            Endpoint::Direct { base_url, .. } | Endpoint::Relay { base_url } => {
                base_url.trim_end_matches('/')
            }
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Direct { base_url, .. } => f
                .debug_struct("Direct")
                .field("base_url", base_url)
                .field("api_key", &"<redacted>")
                .finish(),
            Endpoint::Relay { base_url } => {
                f.debug_struct("Relay").field("base_url", base_url).finish()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    endpoint: Endpoint,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, http: Client::new() }
    }

    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }

    /// Query parameters for one call: location params, then credential, then units.
    pub fn query_params(
        &self,
        mut params: Vec<(&'static str, String)>,
        unit: UnitSystem,
    ) -> Vec<(&'static str, String)> {
        if let Endpoint::Direct { api_key, .. } = &self.endpoint {
            params.push(("appid", api_key.clone()));
        }
        if let Some(units) = unit.query_value() {
            params.push(("units", units.to_string()));
        }
        params
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
        unit: UnitSystem,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.endpoint.base_url(), path);
        let params = self.query_params(params, unit);

        debug!(%url, %unit, "calling provider");

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "provider returned failure status");
            return Err(WeatherError::Upstream { status: status.as_u16(), body });
        }

        serde_json::from_str(&body)
            .map_err(|err| WeatherError::InvalidResponse(format!("{path}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    #[serde(default)]
    sys: OwSys,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwSliceMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwSliceMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl From<OwCurrentResponse> for CurrentObservation {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (icon, condition) = icon_and_description(&parsed.weather);

        CurrentObservation {
            name: parsed.name,
            country: parsed.sys.country,
            coordinates: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            icon,
            condition,
            utc_offset_secs: parsed.timezone,
            observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        }
    }
}

impl From<OwForecastEntry> for ForecastSlice {
    fn from(entry: OwForecastEntry) -> Self {
        let (icon, _) = icon_and_description(&entry.weather);
        let condition = entry
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        ForecastSlice {
            at: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
            temperature: entry.main.temp,
            icon,
            condition,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(
        &self,
        query: &LocationQuery,
        unit: UnitSystem,
    ) -> Result<CurrentObservation, WeatherError> {
        let params = match query {
            LocationQuery::ByName(name) => vec![("q", name.clone())],
            LocationQuery::ByCoordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        };

        let parsed: OwCurrentResponse = self.call("weather", params, unit).await?;
        Ok(parsed.into())
    }

    async fn fetch_forecast(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSlice>, WeatherError> {
        let params = vec![("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())];

        let parsed: OwForecastResponse = self.call("forecast", params, unit).await?;
        Ok(parsed.list.into_iter().map(ForecastSlice::from).collect())
    }
}

fn icon_and_description(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.icon.clone(), w.description.clone()))
        .unwrap_or_else(|| ("01d".to_string(), "Unknown".to_string()))
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
