use async_trait::async_trait;
use samsoft_core::{AccessToken, AppError, AppResult, PrincipalId};
use samsoft_domain::{
    FileKind, ListQuery, ListResult, PermissionMatrix, RecordId, ResourceKind, ResourceRecord,
    Session,
};
use serde_json::{Map, Value};

/// Email and password typed into the login screen.
#[derive(Clone)]
pub struct LoginCredentials {
    /// Login email.
    pub email: String,
    /// Plain password, sent once and never stored.
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    /// Rejects blank fields before any request is made.
    pub fn validate(&self) -> AppResult<()> {
        if self.email.trim().is_empty() {
            return Err(AppError::Validation("email is required".to_owned()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("password is required".to_owned()));
        }

        Ok(())
    }
}

/// Credentials kept across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCredentials {
    /// Current principal id.
    pub principal_id: PrincipalId,
    /// Bearer token.
    pub token: AccessToken,
}

/// Profile and permission matrix returned by login or hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedProfile {
    /// Current principal id.
    pub principal_id: PrincipalId,
    /// Bearer token.
    pub token: AccessToken,
    /// Display name, when the backend sends one.
    pub display_name: Option<String>,
    /// Whether fine-grained checks are bypassed.
    pub is_client_admin: bool,
    /// Module/action grants.
    pub permissions: PermissionMatrix,
}

impl AuthenticatedProfile {
    /// Returns the credentials worth persisting.
    #[must_use]
    pub fn credentials(&self) -> PersistedCredentials {
        PersistedCredentials {
            principal_id: self.principal_id.clone(),
            token: self.token.clone(),
        }
    }

    /// Converts the profile into a session.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session::new(
            self.principal_id,
            self.token,
            self.display_name,
            self.is_client_admin,
            self.permissions,
        )
    }
}

/// File accepted by the upload policy and queued for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name.
    pub file_name: String,
    /// Kind confirmed by extension and leading bytes.
    pub kind: FileKind,
    /// File content.
    pub content: Vec<u8>,
}

/// Body of a create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePayload {
    /// Form fields.
    pub fields: Map<String, Value>,
    /// Files to upload; when present the call goes out as multipart.
    pub attachments: Vec<Attachment>,
}

impl ResourcePayload {
    /// Returns whether the payload must be sent as multipart.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Result of a successful create or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// Message the backend attached to the success envelope.
    pub message: Option<String>,
    /// Saved record, when the backend echoes it.
    pub record: Option<ResourceRecord>,
}

/// Backend operations shared by every resource screen.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Fetches one page of records.
    async fn list(
        &self,
        kind: ResourceKind,
        query: &ListQuery,
    ) -> AppResult<ListResult<ResourceRecord>>;

    /// Fetches one record.
    async fn get(&self, kind: ResourceKind, id: &RecordId) -> AppResult<ResourceRecord>;

    /// Creates a record.
    async fn create(
        &self,
        kind: ResourceKind,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome>;

    /// Updates a record; the id travels in the body.
    async fn update(
        &self,
        kind: ResourceKind,
        id: &RecordId,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome>;

    /// Deletes a record.
    async fn delete(&self, kind: ResourceKind, id: &RecordId) -> AppResult<()>;
}

/// Backend authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges email and password for a profile.
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<AuthenticatedProfile>;

    /// Reloads the profile for persisted credentials.
    async fn profile(&self, credentials: &PersistedCredentials) -> AppResult<AuthenticatedProfile>;

    /// Tells the backend the session ended.
    async fn logout(&self, session: &Session) -> AppResult<()>;
}

/// Persistence port for credentials kept between runs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads persisted credentials, if any.
    async fn load(&self) -> AppResult<Option<PersistedCredentials>>;

    /// Persists credentials after login.
    async fn save(&self, credentials: &PersistedCredentials) -> AppResult<()>;

    /// Removes persisted credentials.
    async fn clear(&self) -> AppResult<()>;
}
