use crate::api::error::err;
use crate::api::{handle_request, AppState, Request};
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

type SharedState = Arc<AppState>;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", query_route("health"))
        .route("/register", command_route("register"))
        .route("/scan", command_route("scan"))
        .route("/get-subjects", query_route("get-subjects"))
        .route("/set-subject", command_route("set-subject"))
        .route("/data", query_route("data"))
        .route("/clear-data", command_route("clear-data"))
        .route("/export", command_route("export"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn query_route(method: &'static str) -> MethodRouter<SharedState> {
    get(move |State(state): State<SharedState>| async move {
        dispatch(state, method, serde_json::Value::Null).await
    })
}

fn command_route(method: &'static str) -> MethodRouter<SharedState> {
    post(move |State(state): State<SharedState>, body: Bytes| async move {
        match parse_body(&body) {
            Ok(params) => dispatch(state, method, params).await,
            Err(resp) => Json(resp),
        }
    })
}

/// An empty body means "no params"; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<serde_json::Value, serde_json::Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| err("bad_params", format!("invalid JSON body: {e}")))
}

async fn dispatch(
    state: SharedState,
    method: &'static str,
    params: serde_json::Value,
) -> Json<serde_json::Value> {
    let outcome =
        tokio::task::spawn_blocking(move || handle_request(&state, Request::new(method, params)))
            .await;
    match outcome {
        Ok(resp) => Json(resp),
        Err(e) => {
            error!(method, error = %e, "handler task failed");
            Json(err("internal", format!("handler task failed: {e}")))
        }
    }
}

pub async fn serve(state: SharedState) -> anyhow::Result<()> {
    let address = state.config.bind_address();
    let app = build_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
