use samsoft_core::{AccessToken, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{AccessRequirement, AppRoute, PermissionMatrix};

/// Authenticated user session held by the auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    principal_id: PrincipalId,
    token: AccessToken,
    display_name: Option<String>,
    is_client_admin: bool,
    permissions: PermissionMatrix,
}

impl Session {
    /// Creates a session from login or hydration data.
    #[must_use]
    pub fn new(
        principal_id: PrincipalId,
        token: AccessToken,
        display_name: Option<String>,
        is_client_admin: bool,
        permissions: PermissionMatrix,
    ) -> Self {
        let display_name = display_name.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Self {
            principal_id,
            token,
            display_name,
            is_client_admin,
            permissions,
        }
    }

    /// Returns the current principal id.
    #[must_use]
    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Returns the display name, if the backend sent one.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns whether fine-grained checks are bypassed.
    #[must_use]
    pub fn is_client_admin(&self) -> bool {
        self.is_client_admin
    }

    /// Returns the permission matrix.
    #[must_use]
    pub fn permissions(&self) -> &PermissionMatrix {
        &self.permissions
    }

    /// Evaluates a requirement against this session.
    #[must_use]
    pub fn has_access(&self, requirement: &AccessRequirement) -> bool {
        if self.is_client_admin || requirement.skips_permission_check() {
            return true;
        }

        requirement.module_key().is_some_and(|module| {
            self.permissions
                .allows(module, requirement.required_action())
        })
    }

    /// Returns the landing page for this kind of user.
    #[must_use]
    pub fn home_route(&self) -> AppRoute {
        if self.is_client_admin {
            AppRoute::AdminDashboard
        } else {
            AppRoute::UserDashboard
        }
    }
}

/// Lifecycle of the session as observed by guards and pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted credentials have not been resolved yet.
    #[default]
    Loading,
    /// A user is signed in.
    Authenticated(Session),
    /// No user is signed in.
    Unauthenticated,
}

impl SessionState {
    /// Returns the session when authenticated.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    /// Returns whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns whether the current user is a client admin.
    #[must_use]
    pub fn is_client_admin(&self) -> bool {
        self.session().is_some_and(Session::is_client_admin)
    }

    /// Returns whether hydration is still pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use samsoft_core::{AccessToken, PrincipalId};

    use super::Session;
    use crate::{AccessRequirement, AppRoute, PermissionMatrix};

    fn session(is_client_admin: bool, permissions: PermissionMatrix) -> Session {
        let principal_id = PrincipalId::new("7").unwrap_or_else(|_| unreachable!());
        let token = AccessToken::new("token").unwrap_or_else(|_| unreachable!());
        Session::new(principal_id, token, None, is_client_admin, permissions)
    }

    #[test]
    fn update_is_denied_when_only_view_is_granted() {
        let session = session(
            false,
            PermissionMatrix::new().with_grant("employee", "view", true),
        );
        let requirement = AccessRequirement::module("employee").action("update");

        assert!(!session.has_access(&requirement));
        assert_eq!(session.home_route(), AppRoute::UserDashboard);
    }

    #[test]
    fn client_admin_bypasses_the_matrix() {
        let session = session(true, PermissionMatrix::new());
        assert!(session.has_access(&AccessRequirement::module("ticket").action("delete")));
        assert!(session.has_access(&AccessRequirement::unscoped()));
        assert_eq!(session.home_route(), AppRoute::AdminDashboard);
    }

    #[test]
    fn missing_module_is_denied_unless_bypassed() {
        let session = session(
            false,
            PermissionMatrix::new().with_grant("employee", "view", true),
        );
        assert!(!session.has_access(&AccessRequirement::unscoped()));
        assert!(session.has_access(&AccessRequirement::open()));
    }

    proptest! {
        #[test]
        fn access_matches_predicate(
            is_client_admin in any::<bool>(),
            no_check in any::<bool>(),
            granted in proptest::option::of(any::<bool>()),
            module in "[ ]{0,2}[A-Za-z]{1,8}[ ]{0,2}",
            action in prop::sample::select(vec!["view", "create", "update", "delete"]),
        ) {
            let mut matrix = PermissionMatrix::new();
            if let Some(allowed) = granted {
                matrix.grant(module.to_lowercase().trim(), action, allowed);
            }
            let session = session(is_client_admin, matrix);
            let mut requirement = AccessRequirement::module(module.as_str()).action(action);
            if no_check {
                requirement = AccessRequirement::open();
            }

            let expected = is_client_admin || no_check || granted == Some(true);
            prop_assert_eq!(session.has_access(&requirement), expected);
        }
    }
}
