// src/server/reload.rs

//! Fan-out of reload notifications from tasks to connected browsers.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::{AssetClass, ReloadScope};

const CHANNEL_CAPACITY: usize = 64;

/// Payload pushed to every connected client after a task wrote outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadEvent {
    pub scope: ReloadScope,
    pub class: AssetClass,
    /// Written files, relative to the served directory.
    pub paths: Vec<String>,
}

/// Cloneable sender side of the reload channel.
///
/// Each SSE connection holds one subscription; the number of live
/// subscriptions is the set of connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHandle {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Push a reload for `class` to every client. Returns how many clients
    /// received it; having none connected is not an error.
    pub fn notify(&self, class: AssetClass, paths: Vec<String>) -> usize {
        let event = ReloadEvent {
            scope: class.reload_scope(),
            class,
            paths,
        };
        match self.tx.send(event) {
            Ok(n) => {
                debug!(class = %class, clients = n, "reload notification sent");
                n
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
