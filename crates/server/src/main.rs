use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{greet_route, healthz_route, GreetRequest, GreetResponse},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext {
            max_name_bytes: settings.max_name_bytes,
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, max_name_bytes = settings.max_name_bytes, "greeting service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(healthz_route(), get(healthz))
        .route(greet_route(), post(greet))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn greet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GreetRequest>,
) -> Result<Json<GreetResponse>, (StatusCode, Json<ApiError>)> {
    api::greet(&state.api, &req.name).map(Json).map_err(|err| {
        warn!(code = ?err.code, "rejected greet request: {}", err.message);
        (status_for(err.code), Json(err))
    })
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
