use samsoft_domain::{AccessRequirement, AppRoute, RouteAccess, RouteCatalog, SessionState};
use tokio::sync::watch;
use tracing::debug;

use crate::Notice;

/// "No Permission" modal plus where dismissing it navigates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialNotice {
    /// Modal content.
    pub notice: Notice,
    /// Role-appropriate landing page.
    pub redirect_to: AppRoute,
}

impl DenialNotice {
    /// Dismisses the modal and returns the navigation target.
    #[must_use]
    pub fn dismiss(self) -> AppRoute {
        self.redirect_to
    }
}

/// What a protected view should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is still loading; render nothing.
    Suspend,
    /// No session; navigate away and render nothing.
    Redirect(AppRoute),
    /// Render the wrapped content.
    Render,
    /// Show the denial modal.
    Deny(DenialNotice),
}

/// Gate for a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGuard {
    requirement: AccessRequirement,
}

impl AuthorizationGuard {
    /// Guards a view with an explicit requirement.
    #[must_use]
    pub fn new(requirement: AccessRequirement) -> Self {
        Self { requirement }
    }

    /// Guards the view mounted at `path`. Public paths and unknown paths have no guard.
    #[must_use]
    pub fn for_path(catalog: &RouteCatalog, path: &str) -> Option<Self> {
        match catalog.access_for(path)? {
            RouteAccess::Public => None,
            RouteAccess::Protected(requirement) => Some(Self::new(requirement)),
        }
    }

    /// Returns the guarded requirement.
    #[must_use]
    pub fn requirement(&self) -> &AccessRequirement {
        &self.requirement
    }

    /// Evaluates the requirement for one session state.
    #[must_use]
    pub fn evaluate(&self, state: &SessionState) -> GuardDecision {
        let session = match state {
            SessionState::Loading => return GuardDecision::Suspend,
            SessionState::Unauthenticated => return GuardDecision::Redirect(AppRoute::Root),
            SessionState::Authenticated(session) => session,
        };

        if session.has_access(&self.requirement) {
            return GuardDecision::Render;
        }

        debug!(
            principal_id = %session.principal_id(),
            module = self
                .requirement
                .module_key()
                .map(|module| module.as_str())
                .unwrap_or("<none>"),
            action = self.requirement.required_action(),
            "access denied"
        );

        GuardDecision::Deny(DenialNotice {
            notice: Notice::no_permission(),
            redirect_to: session.home_route(),
        })
    }

    /// Watches a session channel, re-evaluating on every change.
    #[must_use]
    pub fn watch(self, receiver: watch::Receiver<SessionState>) -> GuardWatch {
        GuardWatch {
            guard: self,
            receiver,
        }
    }
}

/// Reactive guard bound to the session channel.
pub struct GuardWatch {
    guard: AuthorizationGuard,
    receiver: watch::Receiver<SessionState>,
}

impl GuardWatch {
    /// Evaluates the latest state and marks it seen.
    pub fn current(&mut self) -> GuardDecision {
        let state = self.receiver.borrow_and_update().clone();
        self.guard.evaluate(&state)
    }

    /// Waits for the next session change and evaluates it.
    ///
    /// Returns `None` once the auth context is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }
}
