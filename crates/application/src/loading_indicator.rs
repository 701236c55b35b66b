use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Shared loading overlay state, injected into the HTTP client.
///
/// Visible while at least one request holds a [`LoadingTicket`].
#[derive(Clone)]
pub struct LoadingIndicator {
    inner: Arc<LoadingIndicatorInner>,
}

struct LoadingIndicatorInner {
    active: AtomicUsize,
    visible: watch::Sender<bool>,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingIndicator {
    /// Creates a hidden indicator.
    #[must_use]
    pub fn new() -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            inner: Arc::new(LoadingIndicatorInner {
                active: AtomicUsize::new(0),
                visible,
            }),
        }
    }

    /// Registers one in-flight request until the ticket is dropped.
    #[must_use]
    pub fn begin(&self) -> LoadingTicket {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        self.publish();
        LoadingTicket {
            indicator: self.clone(),
        }
    }

    /// Returns whether the overlay is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Returns the number of in-flight requests.
    #[must_use]
    pub fn active_requests(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Subscribes to visibility changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

    fn finish(&self) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
        self.publish();
    }

    // The count is read under the channel lock so the last writer always
    // publishes the final state.
    fn publish(&self) {
        let active = &self.inner.active;
        self.inner.visible.send_if_modified(|visible| {
            let next = active.load(Ordering::SeqCst) > 0;
            let changed = *visible != next;
            *visible = next;
            changed
        });
    }
}

/// RAII handle for one in-flight request.
pub struct LoadingTicket {
    indicator: LoadingIndicator,
}

impl Drop for LoadingTicket {
    fn drop(&mut self) {
        self.indicator.finish();
    }
}
