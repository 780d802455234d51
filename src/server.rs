//! HTTP request surface.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::metrics::StageSummary;
use crate::service::{AskResponse, AskService};

#[derive(Debug, Deserialize)]
struct AskParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

pub fn router(service: Arc<AskService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/ask", get(ask))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve(addr: SocketAddr, service: Arc<AskService>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "smartrecipe listening");
    axum::serve(listener, router(service))
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn root() -> Json<MessageBody> {
    Json(MessageBody {
        message: "SmartRecipe API is running".to_string(),
    })
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn ask(
    State(service): State<Arc<AskService>>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, (StatusCode, Json<MessageBody>)> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageBody {
                message: "query parameter q must not be empty".to_string(),
            }),
        ));
    }
    Ok(Json(service.ask(query).await))
}

async fn metrics(State(service): State<Arc<AskService>>) -> Json<BTreeMap<&'static str, StageSummary>> {
    Json(service.metrics().summary())
}
