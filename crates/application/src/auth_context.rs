//! Process-wide authentication state.
//!
//! `AuthContext` is the only writer of the session channel. Guards, list
//! controllers and the HTTP client read it through [`AuthContext::state`] or
//! a subscription and re-evaluate whenever it changes.
//!
//! Lifecycle: `Loading -> {Authenticated, Unauthenticated}`; an
//! authenticated session ends through logout or expiry and only a fresh
//! login authenticates again.

use std::sync::Arc;

use samsoft_core::{AccessToken, AppError, AppResult, SESSION_EXPIRED_MESSAGE};
use samsoft_domain::{PermissionMatrix, Session, SessionState};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{AuthApi, CredentialStore, LoginCredentials};

/// Shared handle to the session state.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<AuthContextInner>,
}

struct AuthContextInner {
    state: watch::Sender<SessionState>,
    store: Arc<dyn CredentialStore>,
}

impl AuthContext {
    /// Creates a context in the `Loading` state.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            inner: Arc::new(AuthContextInner { state, store }),
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Returns whether the signed-in user is a client admin.
    #[must_use]
    pub fn is_client_admin(&self) -> bool {
        self.inner.state.borrow().is_client_admin()
    }

    /// Returns the permission matrix of the signed-in user.
    #[must_use]
    pub fn permissions(&self) -> Option<PermissionMatrix> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|session| session.permissions().clone())
    }

    /// Returns the session or the "log in again" error, without any I/O.
    pub fn require_session(&self) -> AppResult<Session> {
        self.inner
            .state
            .borrow()
            .session()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_owned()))
    }

    /// Resolves persisted credentials once at start-up.
    ///
    /// Does nothing unless the context is still loading.
    pub async fn hydrate(&self, api: &dyn AuthApi) -> AppResult<SessionState> {
        if !self.inner.state.borrow().is_loading() {
            return Ok(self.state());
        }

        let credentials = match self.inner.store.load().await {
            Ok(credentials) => credentials,
            Err(error) => {
                self.publish(SessionState::Unauthenticated);
                return Err(error);
            }
        };

        let Some(credentials) = credentials else {
            self.publish(SessionState::Unauthenticated);
            return Ok(SessionState::Unauthenticated);
        };

        match api.profile(&credentials).await {
            Ok(profile) => {
                let session = profile.into_session();
                info!(
                    principal_id = %session.principal_id(),
                    is_client_admin = session.is_client_admin(),
                    "session restored"
                );
                let state = SessionState::Authenticated(session);
                self.publish(state.clone());
                Ok(state)
            }
            Err(AppError::Unauthorized(reason)) => {
                warn!(
                    principal_id = %credentials.principal_id,
                    reason = %reason,
                    "persisted session rejected"
                );
                self.inner.store.clear().await?;
                self.publish(SessionState::Unauthenticated);
                Ok(SessionState::Unauthenticated)
            }
            Err(error) => {
                self.publish(SessionState::Unauthenticated);
                Err(error)
            }
        }
    }

    /// Signs in, persists the credentials and publishes the new session.
    pub async fn login(
        &self,
        api: &dyn AuthApi,
        credentials: &LoginCredentials,
    ) -> AppResult<Session> {
        credentials.validate()?;

        let profile = api.login(credentials).await?;
        self.inner.store.save(&profile.credentials()).await?;

        let session = profile.into_session();
        info!(
            principal_id = %session.principal_id(),
            is_client_admin = session.is_client_admin(),
            "signed in"
        );
        self.publish(SessionState::Authenticated(session.clone()));
        Ok(session)
    }

    /// Signs out. The backend call is best effort; local state is always cleared.
    pub async fn logout(&self, api: &dyn AuthApi) -> AppResult<()> {
        let session = self.inner.state.borrow().session().cloned();
        if let Some(session) = session.as_ref() {
            if let Err(error) = api.logout(session).await {
                warn!(
                    principal_id = %session.principal_id(),
                    error = %error,
                    "backend logout failed"
                );
            }
        }

        let cleared = self.inner.store.clear().await;
        self.publish(SessionState::Unauthenticated);
        info!("signed out");
        cleared
    }

    /// Ends the session after the HTTP layer rejected `token`.
    ///
    /// A rejection of a token that is no longer current is ignored, so a late
    /// 401 cannot sign out a newer login.
    pub async fn expire(&self, token: &AccessToken, reason: &str) {
        let principal_id = match self.inner.state.borrow().session() {
            Some(session) if session.token() == token => session.principal_id().clone(),
            Some(session) => {
                debug!(
                    principal_id = %session.principal_id(),
                    "ignoring auth failure for a superseded token"
                );
                return;
            }
            None => return,
        };

        warn!(principal_id = %principal_id, reason = %reason, "session expired");
        if let Err(error) = self.inner.store.clear().await {
            warn!(error = %error, "failed to clear persisted credentials");
        }
        self.publish(SessionState::Unauthenticated);
    }

    fn publish(&self, state: SessionState) {
        self.inner.state.send_replace(state);
    }
}

#[cfg(test)]
mod tests;
