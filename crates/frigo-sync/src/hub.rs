//! # Slot Server
//!
//! The shared "cloud" linked devices meet in. Any device (or the
//! standalone `slot-server` binary) can host it.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SlotServer (Axum)                                │
//! │                                                                         │
//! │  GET  /health          ──► 200 "OK"                                     │
//! │  GET  /slots/{code}    ──► 200 snapshot │ 404 empty │ 400 bad code      │
//! │  PUT  /slots/{code}    ──► 204 stored   │ 400 bad code or body          │
//! │                                                                         │
//! │  slots: RwLock<HashMap<"frigogest_cloud_{code}", CloudSnapshot>>        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A PUT always replaces the slot. The server never compares timestamps;
//! ordering is the devices' business.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use frigo_core::validation::normalize_linking_code;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::cloud::slot_key;
use crate::config::ServerSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::CloudSnapshot;

/// Largest snapshot body accepted (32MB).
const MAX_SNAPSHOT_SIZE: usize = 32 * 1024 * 1024;

// =============================================================================
// Server State
// =============================================================================

/// Snapshots held by the server, keyed by slot key.
#[derive(Default)]
pub struct SlotState {
    slots: RwLock<HashMap<String, CloudSnapshot>>,
}

impl SlotState {
    /// Number of non-empty slots.
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    async fn get(&self, code: &str) -> Option<CloudSnapshot> {
        self.slots.read().await.get(&slot_key(code)).cloned()
    }

    async fn put(&self, code: &str, snapshot: CloudSnapshot) {
        self.slots.write().await.insert(slot_key(code), snapshot);
    }
}

// =============================================================================
// Slot Server
// =============================================================================

/// HTTP server hosting cloud slots.
pub struct SlotServer {
    settings: ServerSettings,
    state: Arc<SlotState>,
}

impl SlotServer {
    pub fn new(settings: ServerSettings) -> Self {
        SlotServer {
            settings,
            state: Arc::new(SlotState::default()),
        }
    }

    /// Builds the router. Exposed for embedding in another axum app.
    pub fn router(state: Arc<SlotState>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/slots/{code}", get(get_slot).put(put_slot))
            .layer(DefaultBodyLimit::max(MAX_SNAPSHOT_SIZE))
            .with_state(state)
    }

    /// Binds the listener and serves in the background.
    pub async fn start(self) -> SyncResult<SlotServerHandle> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let app = Self::router(self.state.clone());

        let bind_addr = self.settings.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| SyncError::ServerError(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Slot server started");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await;
                    info!("Slot server shutting down");
                })
                .await
                .ok();
        });

        Ok(SlotServerHandle {
            state: self.state,
            local_addr,
            shutdown_tx,
        })
    }
}

/// Handle to a running slot server.
pub struct SlotServerHandle {
    state: Arc<SlotState>,
    local_addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
}

impl SlotServerHandle {
    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL clients should use.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub async fn slot_count(&self) -> usize {
        self.state.slot_count().await
    }

    /// Shuts down the server.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Slot server shutdown channel closed".into()))
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn get_slot(
    State(state): State<Arc<SlotState>>,
    Path(code): Path<String>,
) -> Result<Json<CloudSnapshot>, StatusCode> {
    let code = normalize_linking_code(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.get(&code).await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn put_slot(
    State(state): State<Arc<SlotState>>,
    Path(code): Path<String>,
    Json(snapshot): Json<CloudSnapshot>,
) -> StatusCode {
    let Ok(code) = normalize_linking_code(&code) else {
        return StatusCode::BAD_REQUEST;
    };

    debug!(
        code = %code,
        timestamp = snapshot.timestamp,
        device = %snapshot.device_id,
        "Storing snapshot"
    );
    state.put(&code, snapshot).await;
    StatusCode::NO_CONTENT
}
