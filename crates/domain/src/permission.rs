use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Action checked when a requirement does not name one.
pub const DEFAULT_ACTION: &str = "view";

/// Normalised permission module key (trimmed, lower-cased).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Normalises a raw module name. Blank input has no key.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Returns the normalised key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ModuleKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Well-known permission actions used across admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Open a list or detail screen.
    View,
    /// Create a record.
    Create,
    /// Update a record.
    Update,
    /// Delete a record.
    Delete,
}

impl PermissionAction {
    /// Returns the matrix key for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Module to action to flag grant table delivered with the session.
///
/// Module keys are normalised on insert; action keys are matched exactly.
/// Anything absent is denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMatrix {
    modules: BTreeMap<ModuleKey, BTreeMap<String, bool>>,
}

impl PermissionMatrix {
    /// Creates an empty (deny-all) matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one grant, merging with any existing grants for the module.
    pub fn grant(&mut self, module: &str, action: &str, allowed: bool) {
        let Some(key) = ModuleKey::normalize(module) else {
            return;
        };

        self.modules
            .entry(key)
            .or_default()
            .insert(action.to_owned(), allowed);
    }

    /// Builder-style variant of [`PermissionMatrix::grant`].
    #[must_use]
    pub fn with_grant(mut self, module: &str, action: &str, allowed: bool) -> Self {
        self.grant(module, action, allowed);
        self
    }

    /// Returns whether the action is explicitly granted for the module.
    #[must_use]
    pub fn allows(&self, module: &ModuleKey, action: &str) -> bool {
        self.modules
            .get(module)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(false)
    }

    /// Returns whether no module carries any grant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates over the modules that carry at least one `true` grant.
    pub fn granted_modules(&self) -> impl Iterator<Item = &ModuleKey> {
        self.modules
            .iter()
            .filter(|(_, actions)| actions.values().any(|allowed| *allowed))
            .map(|(module, _)| module)
    }
}

impl FromIterator<(String, BTreeMap<String, bool>)> for PermissionMatrix {
    fn from_iter<T: IntoIterator<Item = (String, BTreeMap<String, bool>)>>(iter: T) -> Self {
        let mut matrix = Self::new();
        for (module, actions) in iter {
            for (action, allowed) in actions {
                matrix.grant(module.as_str(), action.as_str(), allowed);
            }
        }
        matrix
    }
}

/// `(module, action)` pair a screen or control needs, plus the bypass flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequirement {
    module: Option<ModuleKey>,
    action: String,
    no_permission_check: bool,
}

impl AccessRequirement {
    /// Requires `view` on the given module.
    #[must_use]
    pub fn module(module: &str) -> Self {
        Self {
            module: ModuleKey::normalize(module),
            action: DEFAULT_ACTION.to_owned(),
            no_permission_check: false,
        }
    }

    /// Requirement with no module at all. Only admins or a bypass pass it.
    #[must_use]
    pub fn unscoped() -> Self {
        Self {
            module: None,
            action: DEFAULT_ACTION.to_owned(),
            no_permission_check: false,
        }
    }

    /// Requirement that always passes for an authenticated session.
    #[must_use]
    pub fn open() -> Self {
        Self {
            no_permission_check: true,
            ..Self::unscoped()
        }
    }

    /// Replaces the required action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Replaces the required action with a well-known one.
    #[must_use]
    pub fn with(self, action: PermissionAction) -> Self {
        self.action(action.as_str())
    }

    /// Returns the normalised module key, if any.
    #[must_use]
    pub fn module_key(&self) -> Option<&ModuleKey> {
        self.module.as_ref()
    }

    /// Returns the required action.
    #[must_use]
    pub fn required_action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns whether the check is bypassed.
    #[must_use]
    pub fn skips_permission_check(&self) -> bool {
        self.no_permission_check
    }
}
