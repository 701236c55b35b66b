use samsoft_core::AppError;

/// Modal flavour the caller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Operation finished.
    Success,
    /// Operation failed.
    Error,
    /// Destructive action waiting for confirmation.
    ConfirmDelete,
    /// Permission predicate failed.
    NoPermission,
}

/// Blocking modal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Modal flavour.
    pub kind: NoticeKind,
    /// Modal heading.
    pub title: String,
    /// Modal body.
    pub message: String,
}

impl Notice {
    /// Success modal.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success".to_owned(),
            message: message.into(),
        }
    }

    /// Error modal with an explicit message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_owned(),
            message: message.into(),
        }
    }

    /// Error modal for a failed call.
    #[must_use]
    pub fn from_error(error: &AppError) -> Self {
        Self::error(error.user_message())
    }

    /// Delete confirmation modal.
    #[must_use]
    pub fn confirm_delete(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::ConfirmDelete,
            title: "Confirm Delete".to_owned(),
            message: message.into(),
        }
    }

    /// "No Permission" modal.
    #[must_use]
    pub fn no_permission() -> Self {
        Self {
            kind: NoticeKind::NoPermission,
            title: "No Permission".to_owned(),
            message: "You do not have permission to access this page.".to_owned(),
        }
    }
}
