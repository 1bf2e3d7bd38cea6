use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::WeatherError, model::Coordinates};

/// Something that can tell where the user is.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    /// Fails with [`WeatherError::GeolocationDenied`] when refused or unavailable.
    async fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// Fixed coordinates, usually the configured home location.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    home: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(home: Option<Coordinates>) -> Self {
        Self { home }
    }
}

#[async_trait]
impl LocationSource for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        self.home.ok_or_else(|| {
            WeatherError::GeolocationDenied(
                "no home location configured (run `weather configure`)".to_string(),
            )
        })
    }
}
