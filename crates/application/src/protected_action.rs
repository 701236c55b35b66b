use samsoft_domain::{AccessRequirement, SessionState};

use crate::{AuthorizationGuard, DenialNotice, GuardDecision};

/// What a denied control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedBehavior {
    /// The control is not rendered.
    Hide,
    /// The control is rendered; activating it shows the denial modal.
    ShowModal,
}

/// Whether to render a protected control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVisibility {
    /// Render the control.
    Visible,
    /// Do not render the control.
    Hidden,
}

/// Result of activating a protected control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    /// The check passed and the callback ran.
    Performed(T),
    /// The check failed; show the modal.
    Denied(DenialNotice),
    /// No session, or the control is hidden; nothing happens.
    Unavailable,
}

/// Single link or button gated by the same predicate as a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedAction {
    guard: AuthorizationGuard,
    on_denied: DeniedBehavior,
}

impl ProtectedAction {
    /// Creates a protected control.
    #[must_use]
    pub fn new(requirement: AccessRequirement, on_denied: DeniedBehavior) -> Self {
        Self {
            guard: AuthorizationGuard::new(requirement),
            on_denied,
        }
    }

    /// Returns whether the control should be rendered.
    #[must_use]
    pub fn visibility(&self, state: &SessionState) -> ActionVisibility {
        match (self.guard.evaluate(state), self.on_denied) {
            (GuardDecision::Render, _) | (GuardDecision::Deny(_), DeniedBehavior::ShowModal) => {
                ActionVisibility::Visible
            }
            _ => ActionVisibility::Hidden,
        }
    }

    /// Runs `on_allowed` only when the check passes.
    pub fn activate<T>(
        &self,
        state: &SessionState,
        on_allowed: impl FnOnce() -> T,
    ) -> ActionOutcome<T> {
        match (self.guard.evaluate(state), self.on_denied) {
            (GuardDecision::Render, _) => ActionOutcome::Performed(on_allowed()),
            (GuardDecision::Deny(denial), DeniedBehavior::ShowModal) => {
                ActionOutcome::Denied(denial)
            }
            _ => ActionOutcome::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use samsoft_core::{AccessToken, PrincipalId};
    use samsoft_domain::{AccessRequirement, PermissionMatrix, Session, SessionState};

    use super::{ActionOutcome, ActionVisibility, DeniedBehavior, ProtectedAction};

    fn viewer() -> SessionState {
        SessionState::Authenticated(Session::new(
            PrincipalId::new("3").unwrap_or_else(|_| unreachable!()),
            AccessToken::new("token").unwrap_or_else(|_| unreachable!()),
            None,
            false,
            PermissionMatrix::new().with_grant("department", "view", true),
        ))
    }

    #[test]
    fn hidden_control_never_runs_callback() {
        let action = ProtectedAction::new(
            AccessRequirement::module("department").action("delete"),
            DeniedBehavior::Hide,
        );
        let state = viewer();
        let mut called = false;

        assert_eq!(action.visibility(&state), ActionVisibility::Hidden);
        let outcome = action.activate(&state, || called = true);
        assert_eq!(outcome, ActionOutcome::Unavailable);
        assert!(!called);
    }

    #[test]
    fn modal_control_reports_denial_on_click() {
        let action = ProtectedAction::new(
            AccessRequirement::module("department").action("delete"),
            DeniedBehavior::ShowModal,
        );
        let state = viewer();

        assert_eq!(action.visibility(&state), ActionVisibility::Visible);
        assert!(matches!(
            action.activate(&state, || ()),
            ActionOutcome::Denied(_)
        ));
    }

    #[test]
    fn allowed_control_runs_callback() {
        let action = ProtectedAction::new(
            AccessRequirement::module("department"),
            DeniedBehavior::Hide,
        );
        assert_eq!(
            action.activate(&viewer(), || "opened"),
            ActionOutcome::Performed("opened")
        );
        assert_eq!(
            action.activate(&SessionState::Loading, || "opened"),
            ActionOutcome::Unavailable
        );
    }
}
