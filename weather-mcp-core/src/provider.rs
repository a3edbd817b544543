use crate::{error::LookupError, model::WeatherReport};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Resolves a city name to a full [`WeatherReport`].
///
/// Implementations hold no per-request state and may be called concurrently.
#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    async fn weather_for_city(&self, city: &str) -> Result<WeatherReport, LookupError>;
}
