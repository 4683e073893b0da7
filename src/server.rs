//! HTTP backend exposing a [`ContainerGateway`] over the dashboard API.
//!
//! `GET /api/containers` lists the fleet, `POST /api/{action}/{id}` runs a
//! lifecycle command and answers `{"status": "<verb>", "container_id": "<id>"}`.
//! Failures carry `{"detail": "..."}` with the upstream status code.

use crate::domain::{ActionResult, ContainerGateway, ContainerRecord, GatewayError, LifecycleAction};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type SharedGateway = Arc<dyn ContainerGateway>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::Api { status, detail } => Self::new(
                upstream_status(*status),
                detail.clone().unwrap_or_else(|| err.to_string()),
            ),
            GatewayError::Http(_) | GatewayError::Decode(_) => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

/// Upstream error statuses pass through; anything else cannot carry a `detail` body
fn upstream_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if code.is_client_error() || code.is_server_error() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(gateway: SharedGateway) -> Router {
    Router::new()
        .route("/api/containers", get(list_containers))
        .route("/api/:action/:id", post(run_action))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(gateway)
}

async fn list_containers(
    State(gateway): State<SharedGateway>,
) -> Result<Json<Vec<ContainerRecord>>, ApiError> {
    let containers = gateway.list().await.map_err(|e| {
        warn!("Listing containers failed: {e}");
        ApiError::from(e)
    })?;
    Ok(Json(containers))
}

async fn run_action(
    State(gateway): State<SharedGateway>,
    Path((action, id)): Path<(String, String)>,
) -> Result<Json<ActionResult>, ApiError> {
    let action = action
        .parse::<LifecycleAction>()
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e.to_string()))?;

    let result = gateway.perform(action, &id).await.map_err(|e| {
        warn!("{action} for container {id} failed: {e}");
        ApiError::from(e)
    })?;

    info!("Container {id} {}", action.past_tense());
    Ok(Json(result))
}

pub async fn serve(addr: SocketAddr, gateway: SharedGateway) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(gateway)).await?;
    Ok(())
}
