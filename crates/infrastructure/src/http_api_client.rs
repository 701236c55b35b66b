use std::time::Duration;

use samsoft_application::{Attachment, AuthContext, LoadingIndicator, PersistedCredentials};
use samsoft_core::{AccessToken, AppError, AppResult, SESSION_EXPIRED_MESSAGE};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::envelope;

/// Whose credentials a request carries.
#[derive(Debug, Clone, Copy)]
pub enum RequestIdentity<'a> {
    /// No bearer header; used by login.
    Anonymous,
    /// The live session. Missing session fails before sending.
    Session,
    /// Credentials supplied by the caller, as during hydration.
    Explicit(&'a PersistedCredentials),
}

/// Shared transport for every backend call.
///
/// Attaches the bearer header, optionally injects `user_id`, drives the
/// loading indicator and turns the response envelope into [`AppResult`].
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    auth: AuthContext,
    loading: LoadingIndicator,
}

impl HttpApiClient {
    /// Creates a client with its own connection pool and request timeout.
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        auth: AuthContext,
        loading: LoadingIndicator,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::with_client(http_client, base_url, auth, loading))
    }

    /// Creates a client over an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(
        http_client: reqwest::Client,
        mut base_url: Url,
        auth: AuthContext,
        loading: LoadingIndicator,
    ) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        Self {
            http_client,
            base_url,
            auth,
            loading,
        }
    }

    /// Returns the session context this client expires on auth failures.
    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// POSTs a JSON body and returns the successful envelope.
    pub async fn post_json(
        &self,
        path: &str,
        mut body: Map<String, Value>,
        identity: RequestIdentity<'_>,
        send_user_id: bool,
    ) -> AppResult<Value> {
        let url = self.endpoint(path)?;
        let credentials = self.credentials(identity)?;
        if send_user_id {
            inject_user_id(&mut body, credentials.as_ref())?;
        }

        let mut request = self.http_client.post(url).json(&Value::Object(body));
        if let Some(credentials) = credentials.as_ref() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                credentials.token.bearer_header(),
            );
        }

        let session_token = session_token(identity, credentials.as_ref());
        self.send(path, request, session_token).await
    }

    /// POSTs fields plus files as `multipart/form-data`.
    pub async fn post_multipart(
        &self,
        path: &str,
        mut fields: Map<String, Value>,
        attachments: &[Attachment],
        identity: RequestIdentity<'_>,
        send_user_id: bool,
    ) -> AppResult<Value> {
        let url = self.endpoint(path)?;
        let credentials = self.credentials(identity)?;
        if send_user_id {
            inject_user_id(&mut fields, credentials.as_ref())?;
        }

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(text) => text,
                other => other.to_string(),
            };
            form = form.text(name, text);
        }
        for attachment in attachments {
            let part = reqwest::multipart::Part::bytes(attachment.content.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(attachment.kind.mime_type())
                .map_err(|error| {
                    AppError::Internal(format!(
                        "invalid MIME type for '{}': {error}",
                        attachment.file_name
                    ))
                })?;
            form = form.part("files", part);
        }

        let mut request = self.http_client.post(url).multipart(form);
        if let Some(credentials) = credentials.as_ref() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                credentials.token.bearer_header(),
            );
        }

        let session_token = session_token(identity, credentials.as_ref());
        self.send(path, request, session_token).await
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| AppError::Internal(format!("invalid endpoint path '{path}': {error}")))
    }

    fn credentials(&self, identity: RequestIdentity<'_>) -> AppResult<Option<PersistedCredentials>> {
        match identity {
            RequestIdentity::Anonymous => Ok(None),
            RequestIdentity::Session => {
                let session = self.auth.require_session()?;
                Ok(Some(PersistedCredentials {
                    principal_id: session.principal_id().clone(),
                    token: session.token().clone(),
                }))
            }
            RequestIdentity::Explicit(credentials) => Ok(Some(credentials.clone())),
        }
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
        session_token: Option<AccessToken>,
    ) -> AppResult<Value> {
        let _ticket = self.loading.begin();
        debug!(path, "sending backend request");

        let response = request.send().await.map_err(|error| {
            warn!(path, error = %error, "backend request failed to complete");
            AppError::Transport(error.to_string())
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|error| {
            warn!(path, error = %error, "backend response body unavailable");
            AppError::Transport(error.to_string())
        })?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            if let Some(token) = session_token.as_ref() {
                self.auth
                    .expire(token, "backend rejected the bearer token")
                    .await;
            }
            return Err(AppError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_owned()));
        }

        let body = match serde_json::from_str::<Value>(text.as_str()) {
            Ok(body) => body,
            Err(_) if text.trim().is_empty() => Value::Null,
            Err(error) if status.is_success() => {
                return Err(AppError::Internal(format!(
                    "backend returned a non-JSON body for '{path}': {error}"
                )));
            }
            Err(_) => Value::Null,
        };

        if !status.is_success() {
            let message = envelope::message(&body);
            warn!(path, status = status.as_u16(), "backend returned an error status");
            return Err(match status {
                reqwest::StatusCode::FORBIDDEN => AppError::Forbidden(
                    message.unwrap_or_else(|| "permission denied".to_owned()),
                ),
                reqwest::StatusCode::NOT_FOUND => {
                    AppError::NotFound(message.unwrap_or_else(|| format!("'{path}' not found")))
                }
                reqwest::StatusCode::CONFLICT => {
                    AppError::Conflict(message.unwrap_or_else(|| "conflicting change".to_owned()))
                }
                _ => AppError::server(message),
            });
        }

        envelope::ensure_success(&body).inspect_err(|error| {
            warn!(path, error = %error, "backend reported failure");
        })?;
        debug!(path, status = status.as_u16(), "backend request succeeded");

        Ok(body)
    }
}

/// Token whose rejection should end the session, for session-backed calls only.
fn session_token(
    identity: RequestIdentity<'_>,
    credentials: Option<&PersistedCredentials>,
) -> Option<AccessToken> {
    match identity {
        RequestIdentity::Session => credentials.map(|credentials| credentials.token.clone()),
        RequestIdentity::Anonymous | RequestIdentity::Explicit(_) => None,
    }
}

fn inject_user_id(
    body: &mut Map<String, Value>,
    credentials: Option<&PersistedCredentials>,
) -> AppResult<()> {
    let credentials = credentials.ok_or_else(|| {
        AppError::Unauthorized("user_id requested without credentials".to_owned())
    })?;
    body.entry("user_id")
        .or_insert_with(|| Value::from(credentials.principal_id.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests;
