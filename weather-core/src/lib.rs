//! Core library for the weather dashboard backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider client and its typed failure modes
//! - Shared domain models (queries, raw provider replies)
//!
//! It is used by `weather-server`, which owns the HTTP surface.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, ProviderConfig, ServerConfig};
pub use error::FetchError;
pub use model::{ProviderReply, WeatherQuery};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
