//! Request handlers for the weather endpoints.
//!
//! Each handler runs Validate -> Invoke provider -> Map result once; every
//! failure becomes an [`ApiError`], which renders as `{"error": "..."}`.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use weather_core::{
    Config, FetchError, OpenWeatherProvider, ProviderReply, WeatherProvider, WeatherQuery,
};

/// Shared, immutable per-process state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Fails when no provider credential is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = OpenWeatherProvider::new(config.provider()?)?;
        Ok(Self::new(Arc::new(provider)))
    }
}

/// Client-facing failures. `Display` is the message sent to the browser.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("Latitude and longitude are required")]
    MissingCoordinates,

    #[error("City name is required")]
    MissingCity,

    #[error("City not found. Please check the spelling.")]
    CityNotFound,

    #[error("Failed to fetch weather data")]
    Upstream(StatusCode),

    #[error("Request timeout. Please try again.")]
    Timeout,

    #[error("Network error. Please check your connection.")]
    Network,

    #[error("An unexpected error occurred.")]
    Unexpected,

    #[error("Resource not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCoordinates | ApiError::MissingCity => StatusCode::BAD_REQUEST,
            ApiError::CityNotFound | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(status) => *status,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Network => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unexpected | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => ApiError::Timeout,
            FetchError::Transport(_) => ApiError::Network,
            FetchError::Unexpected(_) => ApiError::Unexpected,
        }
    }
}

pub async fn dashboard() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

pub async fn weather_by_coordinates(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let query = coordinate_query(body(payload).as_ref()).ok_or(ApiError::MissingCoordinates)?;
    fetch(&state, &query).await
}

pub async fn weather_by_city(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let query = city_query(body(payload).as_ref()).ok_or(ApiError::MissingCity)?;
    fetch(&state, &query).await
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn fetch(state: &AppState, query: &WeatherQuery) -> Result<Json<Value>, ApiError> {
    let reply = state.provider.current_weather(query).await?;
    map_reply(query, reply)
}

fn map_reply(query: &WeatherQuery, reply: ProviderReply) -> Result<Json<Value>, ApiError> {
    match reply.status {
        200 => reply.json().map(Json).map_err(|err| {
            error!(error = %err, "OpenWeather returned an unreadable body");
            ApiError::Unexpected
        }),
        404 if matches!(query, WeatherQuery::City(_)) => Err(ApiError::CityNotFound),
        status => Err(StatusCode::from_u16(status)
            .map(ApiError::Upstream)
            .unwrap_or(ApiError::Unexpected)),
    }
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> Option<Value> {
    match payload {
        Ok(Json(value)) => Some(value),
        Err(rejection) => {
            debug!(reason = %rejection, "rejected request body");
            None
        }
    }
}

fn coordinate_query(body: Option<&Value>) -> Option<WeatherQuery> {
    let fields = body?.as_object()?;
    let lat = coordinate(fields.get("lat"))?;
    let lon = coordinate(fields.get("lon"))?;
    Some(WeatherQuery::Coordinates { lat, lon })
}

/// Accepts a JSON number or a numeric string; zero is a real coordinate.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn city_query(body: Option<&Value>) -> Option<WeatherQuery> {
    match body?.get("city")? {
        Value::String(city) if !city.is_empty() => Some(WeatherQuery::City(city.clone())),
        _ => None,
    }
}
