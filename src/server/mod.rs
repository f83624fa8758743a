// src/server/mod.rs

//! Development server.
//!
//! Serves the output tree as static files and keeps every connected browser
//! subscribed to reload notifications over Server-Sent Events.
//!
//! - [`reload`] is the broadcast channel tasks notify after writing outputs.
//! - [`inject`] adds the live-reload client to every HTML page it serves.
//! - [`sse`] streams reload events to browsers.

pub mod inject;
pub mod reload;
pub mod sse;

use std::path::PathBuf;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::errors::Result;

pub use inject::inject_script;
pub use reload::{ReloadEvent, ReloadHandle};

/// Path of the SSE stream.
pub const EVENTS_PATH: &str = "/__assetpipe/events";

/// Path of the injected client script.
pub const CLIENT_PATH: &str = "/__assetpipe/client.js";

#[derive(Debug, Clone)]
pub(crate) struct ServerState {
    pub(crate) reload: ReloadHandle,
}

/// Router serving `root` with live reload.
pub fn router(root: impl Into<PathBuf>, reload: ReloadHandle) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(sse::events_handler))
        .route(CLIENT_PATH, get(inject::client_script))
        .with_state(ServerState { reload })
        .fallback_service(ServeDir::new(root.into()).append_index_html_on_directories(true))
        .layer(middleware::from_fn(inject::inject_live_reload))
}

/// Serve `root` on an already bound listener until the process exits.
pub async fn serve_on(listener: TcpListener, root: PathBuf, reload: ReloadHandle) -> Result<()> {
    let app = router(root, reload);
    axum::serve(listener, app).await?;
    Ok(())
}
