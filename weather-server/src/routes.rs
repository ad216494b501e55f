use std::any::Any;

use anyhow::{Context, Result};
use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};
use weather_core::Config;

use crate::api::{self, ApiError, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::dashboard))
        .route("/api/weather/coords", post(api::weather_by_coordinates))
        .route("/api/weather/city", post(api::weather_by_city))
        .fallback(api::not_found)
        .method_not_allowed_fallback(api::method_not_allowed)
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C. Refuses to start without a provider key.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let addr = config.server.bind_address();

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Weather dashboard running at http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated with an error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!(error = %err, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!(detail, "request handler panicked");
    ApiError::Internal.into_response()
}
