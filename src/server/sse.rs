// src/server/sse.rs

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::server::ServerState;

/// SSE endpoint: one `connected` event, then a `reload` event (JSON
/// [`ReloadEvent`](crate::server::ReloadEvent)) per notification.
pub(crate) async fn events_handler(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.reload.subscribe();
    debug!(clients = state.reload.client_count(), "live-reload client connected");

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(reload) => {
                    if let Ok(json) = serde_json::to_string(&reload) {
                        yield Ok(Event::default().event("reload").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "live-reload client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
