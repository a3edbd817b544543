//! Core library of the weather MCP proxy.
//!
//! This crate defines:
//! - The weather lookup against Open-Meteo (geocoding + forecast)
//! - The request router speaking the `/mcp` envelope protocol
//! - Shared domain models (locations, conditions, reports)
//! - Configuration handling
//!
//! It is used by `weather-mcp-server` and `weather-mcp-cli`.

pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod protocol;
pub mod provider;
pub mod router;

pub use config::Config;
pub use error::{LookupError, RpcError};
pub use model::{CurrentConditions, DailyForecastEntry, Location, WeatherReport};
pub use protocol::{InboundEnvelope, OutboundEnvelope};
pub use provider::{OpenMeteoProvider, WeatherLookup};
pub use router::McpRouter;
