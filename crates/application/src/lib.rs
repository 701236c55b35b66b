//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_context;
mod authorization_guard;
mod loading_indicator;
mod notice;
mod ports;
mod protected_action;
mod resource_form;
mod resource_list_controller;

pub use auth_context::AuthContext;
pub use authorization_guard::{AuthorizationGuard, DenialNotice, GuardDecision, GuardWatch};
pub use loading_indicator::{LoadingIndicator, LoadingTicket};
pub use notice::{Notice, NoticeKind};
pub use ports::{
    Attachment, AuthApi, AuthenticatedProfile, CredentialStore, LoginCredentials,
    MutationOutcome, PersistedCredentials, ResourceApi, ResourcePayload,
};
pub use protected_action::{ActionOutcome, ActionVisibility, DeniedBehavior, ProtectedAction};
pub use resource_form::{
    AttachOutcome, AttachmentCandidate, FormMode, PreviewHandle, PreviewRegistry, RejectedFile,
    ResourceForm, SubmitOutcome,
};
pub use resource_list_controller::{
    DEFAULT_SEARCH_DEBOUNCE, DeleteOutcome, FetchOutcome, ListSnapshot, PendingDelete,
    ResourceListController,
};
