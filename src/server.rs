//! The HTTP server behind `finsync serve`: hosts the dashboard page and a small JSON API.
//!
//! `GET /` serves the page with its `financeData` literal replaced by the store's current
//! dataset, so a browser always opens on whatever was last synced or saved. The API mirrors
//! the CLI: the browser saves edits to the store with `/api/save`, and the two sync
//! directions are exposed as `/api/export` and `/api/import`.

use crate::model::{Category, Dataset};
use crate::store::DataStore;
use crate::sync::{self, SyncReport};
use crate::{page, utils, Config, Result};
use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    config: Config,
    store: Box<dyn DataStore>,
}

impl AppState {
    pub fn new(config: Config, store: Box<dyn DataStore>) -> Self {
        Self { config, store }
    }
}

/// The envelope around every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    fn ok_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Runs the server until SIGINT or SIGTERM.
pub async fn run(config: Config, store: Box<dyn DataStore>, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(config, store));
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!("Serving the dashboard on http://{}:{}", local_ip(), port);
    info!("API endpoints: /api/data, /api/save, /api/export, /api/import");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(serve_page))
        .route("/api/data", get(data))
        .route("/api/save", post(save))
        .route("/api/export", post(export))
        .route("/api/import", post(import))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// GET / - the dashboard page with the store's dataset injected into the literal.
async fn serve_page(State(state): State<Arc<AppState>>) -> Response {
    let page_path = state.config.page_path();
    let text = match utils::read(&page_path).await {
        Ok(text) => text,
        Err(e) => {
            error!("Unable to read the page: {e:#}");
            let message = format!("No dashboard page at {}", page_path.display());
            return (StatusCode::NOT_FOUND, message).into_response();
        }
    };
    match inject(&state, text).await {
        Ok(text) => Html(text).into_response(),
        Err(e) => {
            error!("Unable to serve the page: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response()
        }
    }
}

/// Replaces the page's literal with the stored dataset; an empty store serves the page
/// as it sits on disk.
async fn inject(state: &AppState, text: String) -> Result<String> {
    match state.store.load().await? {
        Some(dataset) => page::replace(&text, &dataset),
        None => Ok(text),
    }
}

/// GET /api/data - the store's current dataset, empty when nothing has been saved yet.
async fn data(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ApiResponse<Dataset>>) {
    match state.store.load().await {
        Ok(dataset) => (
            StatusCode::OK,
            Json(ApiResponse::ok(dataset.unwrap_or_default())),
        ),
        Err(e) => internal_error(&e),
    }
}

/// POST /api/save - whole-document replacement of the store's dataset.
async fn save(
    State(state): State<Arc<AppState>>,
    Json(dataset): Json<Dataset>,
) -> (StatusCode, Json<ApiResponse<BTreeMap<Category, usize>>>) {
    match state.store.save(&dataset).await {
        Ok(()) => {
            info!("Saved {} records from the browser", dataset.total_records());
            (
                StatusCode::OK,
                Json(ApiResponse::ok_message("Data saved", dataset.counts())),
            )
        }
        Err(e) => internal_error(&e),
    }
}

/// POST /api/export - sync the workbook's records to the page.
async fn export(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ApiResponse<SyncReport>>) {
    match sync::export(&state.config, state.store.as_ref()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::ok_message(report.summary(), report)),
        ),
        Err(e) => internal_error(&e),
    }
}

/// POST /api/import - sync the page's records to the workbook.
async fn import(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ApiResponse<SyncReport>>) {
    match sync::import(&state.config, state.store.as_ref()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::ok_message(report.summary(), report)),
        ),
        Err(e) => internal_error(&e),
    }
}

fn internal_error<T: Serialize>(e: &crate::Error) -> (StatusCode, Json<ApiResponse<T>>) {
    error!("Request failed: {e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::err(format!("{e:#}"))),
    )
}

/// Best-effort discovery of the LAN address so the startup banner can show a URL that other
/// devices on the network can open. No packets are sent; connecting a UDP socket only picks
/// the local interface that would route there.
fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Graceful shutdown on SIGINT or SIGTERM. A signal handler that cannot be installed is
/// logged and ignored rather than treated as a shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to install the Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Unable to install the SIGTERM handler: {e}");
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

    info!("Shutdown signal received, stopping the server");
}
