use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::{FetchError, ProviderConfig, ProviderReply, WeatherQuery};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("weather-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
        })
    }

    async fn fetch(&self, query: &WeatherQuery) -> Result<ProviderReply, reqwest::Error> {
        let mut params = query.location_params();
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));

        let res = self.http.get(&self.base_url).query(&params).send().await?;

        let status = res.status().as_u16();
        let body = res.text().await?;

        Ok(ProviderReply { status, body })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current_weather(&self, query: &WeatherQuery) -> Result<ProviderReply, FetchError> {
        match self.fetch(query).await {
            Ok(reply) => {
                if reply.is_success() {
                    debug!(bytes = reply.body.len(), "OpenWeather answered");
                } else {
                    warn!(
                        status = reply.status,
                        body = %truncate_body(&reply.body),
                        "OpenWeather request failed"
                    );
                }
                Ok(reply)
            }
            Err(err) => {
                let err = FetchError::from(err.without_url());
                warn!(error = %err, "OpenWeather request did not complete");
                Err(err)
            }
        }
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
