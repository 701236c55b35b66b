use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use samsoft_application::{CredentialStore, PersistedCredentials};
use samsoft_core::{AccessToken, AppError, AppResult, PrincipalId};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Serialize)]
struct StoredCredentials<'a> {
    user_id: &'a str,
    token: &'a str,
    saved_at: DateTime<Utc>,
}

/// Credential store backed by a JSON file.
///
/// Reads the legacy `userId`/`id` and `access_token` keys as well, so files
/// written by older clients still hydrate.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    /// Creates a store for the given file. Nothing is touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn load(&self) -> AppResult<Option<PersistedCredentials>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read credentials from '{}': {error}",
                    self.path.display()
                )));
            }
        };

        let Ok(value) = serde_json::from_str::<Value>(contents.as_str()) else {
            warn!(path = %self.path.display(), "ignoring unreadable credentials file");
            return Ok(None);
        };

        let credentials = parse_stored(&value);
        if credentials.is_none() {
            debug!(path = %self.path.display(), "credentials file has no usable entry");
        }
        Ok(credentials)
    }

    async fn save(&self, credentials: &PersistedCredentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create credentials directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let contents = serde_json::to_vec_pretty(&StoredCredentials {
            user_id: credentials.principal_id.as_str(),
            token: credentials.token.expose(),
            saved_at: Utc::now(),
        })
        .map_err(|error| AppError::Internal(format!("failed to encode credentials: {error}")))?;

        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write credentials to '{}': {error}",
                    self.path.display()
                ))
            })
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to remove credentials file '{}': {error}",
                self.path.display()
            ))),
        }
    }
}

fn parse_stored(value: &Value) -> Option<PersistedCredentials> {
    let text = |key: &str| -> Option<String> {
        match value.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    };

    let ids = [text("user_id"), text("userId"), text("id")];
    let principal_id = PrincipalId::resolve(ids.iter().map(Option::as_deref))?;
    let token = [text("token"), text("access_token")]
        .into_iter()
        .flatten()
        .find_map(|token| AccessToken::new(token).ok())?;

    Some(PersistedCredentials {
        principal_id,
        token,
    })
}

/// Credential store that forgets everything on exit.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<Option<PersistedCredentials>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds credentials.
    #[must_use]
    pub fn with_credentials(credentials: PersistedCredentials) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> AppResult<Option<PersistedCredentials>> {
        Ok(self.credentials.read().await.clone())
    }

    async fn save(&self, credentials: &PersistedCredentials) -> AppResult<()> {
        *self.credentials.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.credentials.write().await = None;
        Ok(())
    }
}
