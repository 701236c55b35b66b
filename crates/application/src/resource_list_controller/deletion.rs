use samsoft_domain::RecordId;
use tracing::{info, warn};

use crate::Notice;

use super::{FetchOutcome, ResourceListController};

/// Delete waiting for the user to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    /// One row.
    Single(RecordId),
    /// The selected rows.
    Bulk(Vec<RecordId>),
}

impl PendingDelete {
    fn ids(&self) -> Vec<RecordId> {
        match self {
            Self::Single(id) => vec![id.clone()],
            Self::Bulk(ids) => ids.clone(),
        }
    }
}

/// How a confirmed delete ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing was waiting for confirmation.
    NothingPending,
    /// Every record was deleted and the page re-fetched.
    Deleted {
        /// Success modal.
        notice: Notice,
        /// Outcome of the re-fetch.
        refreshed: FetchOutcome,
    },
    /// A delete call failed.
    Failed {
        /// Error modal.
        notice: Notice,
    },
}

impl ResourceListController {
    /// Opens the confirmation modal for one row. Nothing is deleted yet.
    pub async fn request_delete(&self, id: RecordId) -> Notice {
        let label = self.inner.kind.label().to_lowercase();
        self.inner.state.lock().await.pending_delete = Some(PendingDelete::Single(id));
        Notice::confirm_delete(format!("Are you sure you want to delete this {label}?"))
    }

    /// Opens the confirmation modal for the selected rows.
    ///
    /// Returns `None` when nothing is selected.
    pub async fn request_bulk_delete(&self) -> Option<Notice> {
        let mut state = self.inner.state.lock().await;
        if state.selected.is_empty() {
            return None;
        }

        let ids: Vec<RecordId> = state.selected.iter().cloned().collect();
        let message = format!(
            "Are you sure you want to delete {}?",
            self.count_label(ids.len())
        );
        state.pending_delete = Some(PendingDelete::Bulk(ids));
        Some(Notice::confirm_delete(message))
    }

    /// Closes the confirmation modal without touching the list.
    pub async fn cancel_delete(&self) {
        self.inner.state.lock().await.pending_delete = None;
    }

    /// Deletes what the modal asked about, then re-fetches the current page.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let Some(pending) = self.inner.state.lock().await.pending_delete.take() else {
            return DeleteOutcome::NothingPending;
        };

        let ids = pending.ids();
        let mut deleted = Vec::with_capacity(ids.len());
        let mut failure = None;
        for id in ids {
            match self.inner.api.delete(self.inner.kind, &id).await {
                Ok(()) => {
                    info!(resource = %self.inner.kind, id = %id, "record deleted");
                    deleted.push(id);
                }
                Err(error) => {
                    warn!(
                        resource = %self.inner.kind,
                        id = %id,
                        error = %error,
                        "record delete failed"
                    );
                    failure = Some(error);
                    break;
                }
            }
        }

        if !deleted.is_empty() {
            let mut state = self.inner.state.lock().await;
            for id in &deleted {
                state.selected.remove(id);
            }
        }

        if let Some(error) = failure {
            if !deleted.is_empty() {
                self.fetch().await;
            }
            return DeleteOutcome::Failed {
                notice: Notice::from_error(&error),
            };
        }

        let message = match pending {
            PendingDelete::Single(_) => format!("{} deleted successfully.", self.inner.kind.label()),
            PendingDelete::Bulk(_) => {
                format!("{} deleted successfully.", self.count_label(deleted.len()))
            }
        };
        let refreshed = self.fetch().await;

        DeleteOutcome::Deleted {
            notice: Notice::success(message),
            refreshed,
        }
    }

    fn count_label(&self, count: usize) -> String {
        let kind = self.inner.kind;
        if count == 1 {
            format!("1 {}", kind.label().to_lowercase())
        } else {
            format!("{count} {}", kind.plural_label().to_lowercase())
        }
    }
}
