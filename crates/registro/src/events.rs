//! Artifact-added notifications.

use crate::result::RegistroResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Published once for every artifact written by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactAddedEvent {
    /// Path relative to the artifacts root, as given by the caller
    pub relative_file_path: String,
    /// Absolute path of the written file
    pub absolute_file_path: PathBuf,
    /// Optional artifact type (e.g. "Screenshot")
    pub artifact_type: Option<String>,
    /// Optional human-readable title
    pub artifact_title: Option<String>,
}

/// Handle returned by [`ArtifactSubscribers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&ArtifactAddedEvent) -> RegistroResult<()>>;

/// Ordered list of artifact-added handlers
#[derive(Default)]
pub struct ArtifactSubscribers {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl fmt::Debug for ArtifactSubscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactSubscribers")
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}

impl ArtifactSubscribers {
    /// Create an empty subscriber list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; handlers run in registration order
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ArtifactAddedEvent) -> RegistroResult<()> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler, returning whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Invoke every handler in order.
    ///
    /// Stops at and returns the first handler error.
    pub fn publish(&mut self, event: &ArtifactAddedEvent) -> RegistroResult<()> {
        debug!(
            relative_file_path = %event.relative_file_path,
            handlers = self.handlers.len(),
            "Publishing ArtifactAddedEvent"
        );
        for (_, handler) in &mut self.handlers {
            handler(event)?;
        }
        Ok(())
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if there are no handlers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
