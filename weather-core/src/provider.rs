use crate::{
    config::{ApiMode, Config},
    error::WeatherError,
    model::{Coordinates, CurrentObservation, ForecastSlice, LocationQuery, UnitSystem},
    provider::openweather::{Endpoint, OpenWeatherProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// The two upstream calls a query sequence is made of.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        query: &LocationQuery,
        unit: UnitSystem,
    ) -> Result<CurrentObservation, WeatherError>;

    async fn fetch_forecast(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSlice>, WeatherError>;
}

/// Construct the upstream client described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let endpoint = endpoint_for(config, config.api_key())?;
    let provider =
        OpenWeatherProvider::with_timeout(endpoint, Duration::from_secs(config.timeout_secs))?;
    Ok(Box::new(provider))
}

/// Pick the endpoint for `config`, given the already-resolved API key.
fn endpoint_for(config: &Config, api_key: Option<String>) -> anyhow::Result<Endpoint> {
    let endpoint = match config.mode {
        ApiMode::Direct => {
            let api_key = api_key.ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for direct mode.\n\
                     Hint: run `weather configure` or set OWM_API_KEY."
                )
            })?;
            Endpoint::Direct { base_url: config.base_url.clone(), api_key }
        }
        ApiMode::Relay => Endpoint::Relay { base_url: config.relay_url.clone() },
    };
    Ok(endpoint)
}
