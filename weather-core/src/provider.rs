use crate::{FetchError, ProviderReply, WeatherQuery};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current-weather data.
///
/// Implementations return the provider's status and body as-is; mapping them
/// to client responses is the caller's job.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, query: &WeatherQuery) -> Result<ProviderReply, FetchError>;
}
