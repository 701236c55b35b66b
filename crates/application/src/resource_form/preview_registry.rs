use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use uuid::Uuid;

/// Preview URL for an image attachment, valid until revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
}

impl PreviewHandle {
    /// Returns the preview URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Tracks live preview URLs so every one can be revoked.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<BTreeSet<Uuid>>>,
}

impl PreviewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a preview URL for a file.
    #[must_use]
    pub fn create(&self, file_name: &str) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);

        PreviewHandle {
            id,
            url: format!("preview://{id}/{file_name}"),
        }
    }

    /// Revokes a preview URL. Returns whether it was still live.
    pub fn revoke(&self, handle: &PreviewHandle) -> bool {
        let revoked = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id);
        if revoked {
            debug!(url = handle.url(), "preview revoked");
        }
        revoked
    }

    /// Returns the number of previews not yet revoked.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
