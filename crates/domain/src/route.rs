use std::fmt::{Display, Formatter};

use url::form_urlencoded;

use crate::{AccessRequirement, PermissionAction, RecordId, ResourceKind};

/// Paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/careers",
    "/careers/apply",
];

/// Which detail screen a row action opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailMode {
    /// Read-only detail.
    View,
    /// Edit form.
    Edit,
}

impl DetailMode {
    fn segment(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

/// Navigation target emitted by guards, lists and forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppRoute {
    /// Landing page.
    Root,
    /// Login screen.
    Login,
    /// Client-admin landing page.
    AdminDashboard,
    /// Regular user landing page.
    UserDashboard,
    /// Admin list screen for a resource.
    List(ResourceKind),
    /// Admin create form for a resource.
    Create(ResourceKind),
    /// Admin detail or edit screen for one record.
    Detail {
        /// Resource the record belongs to.
        kind: ResourceKind,
        /// Record id carried as a query parameter.
        id: RecordId,
        /// View or edit.
        mode: DetailMode,
    },
}

impl AppRoute {
    /// Returns the path (and query string) for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::AdminDashboard => "/admin/dashboard".to_owned(),
            Self::UserDashboard => "/user/dashboard".to_owned(),
            Self::List(kind) => format!("/admin/{}", kind.route_segment()),
            Self::Create(kind) => format!("/admin/{}/add", kind.route_segment()),
            Self::Detail { kind, id, mode } => format!(
                "/admin/{}/{}?{}",
                kind.route_segment(),
                mode.segment(),
                form_urlencoded::Serializer::new(String::new())
                    .append_pair("id", id.as_str())
                    .finish()
            ),
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.path().as_str())
    }
}

/// Access rule attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Reachable without a session.
    Public,
    /// Wrapped by the authorization guard.
    Protected(AccessRequirement),
}

/// Resolves paths of the routing surface to their access rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteCatalog;

impl RouteCatalog {
    /// Returns the access rule for a path, ignoring query string and trailing slash.
    ///
    /// Unknown paths resolve to `None`.
    #[must_use]
    pub fn access_for(&self, path: &str) -> Option<RouteAccess> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };

        if PUBLIC_PATHS.contains(&path) {
            return Some(RouteAccess::Public);
        }

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["admin" | "user", "dashboard" | "profile"] => {
                Some(RouteAccess::Protected(AccessRequirement::open()))
            }
            ["admin", resource, rest @ ..] => {
                let kind = kind_for_segment(resource)?;
                let action = match rest {
                    [] | ["view"] => PermissionAction::View,
                    ["add"] => PermissionAction::Create,
                    ["edit"] => PermissionAction::Update,
                    _ => return None,
                };
                Some(RouteAccess::Protected(
                    kind.requirement(action.as_str()),
                ))
            }
            ["user", resource] => {
                let kind = kind_for_segment(resource)?;
                Some(RouteAccess::Protected(
                    kind.requirement(PermissionAction::View.as_str()),
                ))
            }
            _ => None,
        }
    }
}

fn kind_for_segment(segment: &str) -> Option<ResourceKind> {
    ResourceKind::all()
        .iter()
        .copied()
        .find(|kind| kind.route_segment() == segment)
}
