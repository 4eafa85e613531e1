use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub const DEFAULT_PREVIEW_PORT: u16 = 8090;

/// Code buffer shown by the preview server; replace it to refresh the page.
#[derive(Clone, Default)]
pub struct PreviewState {
    code: Arc<RwLock<String>>,
}

impl PreviewState {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Arc::new(RwLock::new(code.into())),
        }
    }

    pub async fn update(&self, code: &str) {
        let mut current = self.code.write().await;
        if *current != code {
            *current = code.to_string();
        }
    }
}

pub fn build_router(state: PreviewState) -> Router {
    Router::new()
        .route("/", get(show_component))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .fallback(not_found)
        .with_state(state)
}

async fn show_component(State(state): State<PreviewState>) -> Html<String> {
    Html(state.code.read().await.clone())
}

async fn not_found(req: axum::extract::Request) -> impl IntoResponse {
    tracing::warn!("unhandled path: {}", req.uri());
    (StatusCode::NOT_FOUND, "Not Found")
}

/// A preview server running in the background.
pub struct PreviewServer {
    pub addr: SocketAddr,
    pub state: PreviewState,
    task: JoinHandle<()>,
}

impl PreviewServer {
    pub async fn spawn(port: u16, state: PreviewState) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind preview port {port}"))?;
        let addr = listener.local_addr().context("failed to read preview address")?;
        let app = build_router(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "preview server stopped");
            }
        });

        tracing::info!(%addr, "preview server listening");
        Ok(Self { addr, state, task })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

/// Serve `code` until Ctrl-C.
pub async fn serve(code: &str, port: u16) -> Result<()> {
    let server = PreviewServer::spawn(port, PreviewState::new(code)).await?;
    println!("Previewing on {}  (Ctrl-C to stop)", server.url());
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    server.stop();
    Ok(())
}
