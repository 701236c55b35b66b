use std::sync::Arc;

use async_trait::async_trait;
use samsoft_core::{AccessToken, AppError, AppResult, PrincipalId};
use samsoft_domain::{Session, SessionState};
use tokio::sync::Mutex;

use crate::{
    AuthApi, AuthenticatedProfile, CredentialStore, LoginCredentials, PersistedCredentials,
};

use super::AuthContext;

#[derive(Default)]
struct FakeCredentialStore {
    stored: Mutex<Option<PersistedCredentials>>,
    read_only: bool,
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn load(&self) -> AppResult<Option<PersistedCredentials>> {
        Ok(self.stored.lock().await.clone())
    }

    async fn save(&self, credentials: &PersistedCredentials) -> AppResult<()> {
        *self.stored.lock().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        if self.read_only {
            return Err(AppError::Internal("disk read-only".to_owned()));
        }
        *self.stored.lock().await = None;
        Ok(())
    }
}

#[derive(Default)]
struct FakeAuthApi {
    reject_profile: bool,
    logout_calls: Mutex<u32>,
}

fn profile(principal_id: &str, token: &str) -> AuthenticatedProfile {
    AuthenticatedProfile {
        principal_id: PrincipalId::new(principal_id).unwrap_or_else(|_| unreachable!()),
        token: AccessToken::new(token).unwrap_or_else(|_| unreachable!()),
        display_name: Some("Asha".to_owned()),
        is_client_admin: false,
        permissions: samsoft_domain::PermissionMatrix::new().with_grant("employee", "view", true),
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<AuthenticatedProfile> {
        if credentials.password != "correct" {
            return Err(AppError::server(Some("Invalid email or password".to_owned())));
        }
        Ok(profile("17", "fresh-token"))
    }

    async fn profile(&self, credentials: &PersistedCredentials) -> AppResult<AuthenticatedProfile> {
        if self.reject_profile {
            return Err(AppError::Unauthorized("token expired".to_owned()));
        }
        Ok(profile(
            credentials.principal_id.as_str(),
            credentials.token.expose(),
        ))
    }

    async fn logout(&self, _session: &Session) -> AppResult<()> {
        *self.logout_calls.lock().await += 1;
        Err(AppError::Transport("offline".to_owned()))
    }
}

fn stored_credentials() -> PersistedCredentials {
    PersistedCredentials {
        principal_id: PrincipalId::new("17").unwrap_or_else(|_| unreachable!()),
        token: AccessToken::new("stored-token").unwrap_or_else(|_| unreachable!()),
    }
}

#[tokio::test]
async fn hydrate_without_credentials_is_unauthenticated() {
    let context = AuthContext::new(Arc::new(FakeCredentialStore::default()));
    assert!(context.state().is_loading());

    let state = context.hydrate(&FakeAuthApi::default()).await;
    assert!(matches!(state, Ok(SessionState::Unauthenticated)));
    assert!(!context.is_authenticated());
    assert!(context.require_session().is_err());
}

#[tokio::test]
async fn hydrate_restores_persisted_session() {
    let store = Arc::new(FakeCredentialStore::default());
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store);

    let state = context.hydrate(&FakeAuthApi::default()).await;
    assert!(state.is_ok());
    assert!(context.is_authenticated());

    let session = context.require_session().unwrap_or_else(|_| unreachable!());
    assert_eq!(session.token().expose(), "stored-token");
    assert_eq!(session.display_name(), Some("Asha"));
}

#[tokio::test]
async fn hydrate_clears_rejected_credentials() {
    let store = Arc::new(FakeCredentialStore::default());
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store.clone());
    let api = FakeAuthApi {
        reject_profile: true,
        ..FakeAuthApi::default()
    };

    let state = context.hydrate(&api).await;
    assert!(matches!(state, Ok(SessionState::Unauthenticated)));
    assert!(store.stored.lock().await.is_none());
}

#[tokio::test]
async fn login_persists_credentials_and_notifies_subscribers() {
    let store = Arc::new(FakeCredentialStore::default());
    let context = AuthContext::new(store.clone());
    let mut receiver = context.subscribe();
    let api = FakeAuthApi::default();
    assert!(context.hydrate(&api).await.is_ok());
    assert!(receiver.changed().await.is_ok());
    assert!(!receiver.borrow_and_update().is_authenticated());

    let session = context
        .login(
            &api,
            &LoginCredentials {
                email: "asha@example.com".to_owned(),
                password: "correct".to_owned(),
            },
        )
        .await;
    assert!(session.is_ok());
    assert!(receiver.changed().await.is_ok());
    assert!(receiver.borrow_and_update().is_authenticated());

    let stored = store.stored.lock().await.clone();
    assert_eq!(
        stored.map(|credentials| credentials.token.expose().to_owned()),
        Some("fresh-token".to_owned())
    );
}

#[tokio::test]
async fn login_with_blank_password_never_calls_backend() {
    let context = AuthContext::new(Arc::new(FakeCredentialStore::default()));
    let result = context
        .login(
            &FakeAuthApi::default(),
            &LoginCredentials {
                email: "asha@example.com".to_owned(),
                password: String::new(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn logout_clears_state_even_when_backend_fails() {
    let store = Arc::new(FakeCredentialStore::default());
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store.clone());
    let api = FakeAuthApi::default();
    assert!(context.hydrate(&api).await.is_ok());

    assert!(context.logout(&api).await.is_ok());
    assert_eq!(*api.logout_calls.lock().await, 1);
    assert_eq!(context.state(), SessionState::Unauthenticated);
    assert!(store.stored.lock().await.is_none());
}

#[tokio::test]
async fn logout_publishes_signed_out_state_when_store_cannot_clear() {
    let store = Arc::new(FakeCredentialStore {
        read_only: true,
        ..FakeCredentialStore::default()
    });
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store);
    let api = FakeAuthApi::default();
    assert!(context.hydrate(&api).await.is_ok());
    assert!(context.is_authenticated());

    let result = context.logout(&api).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(context.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn expire_only_affects_authenticated_sessions() {
    let store = Arc::new(FakeCredentialStore::default());
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store.clone());
    let token = stored_credentials().token;

    context.expire(&token, "401 from backend").await;
    assert!(context.state().is_loading());

    assert!(context.hydrate(&FakeAuthApi::default()).await.is_ok());
    context.expire(&token, "401 from backend").await;
    assert_eq!(context.state(), SessionState::Unauthenticated);
    assert!(store.stored.lock().await.is_none());
}

#[tokio::test]
async fn rejection_of_superseded_token_keeps_newer_login() {
    let store = Arc::new(FakeCredentialStore::default());
    *store.stored.lock().await = Some(stored_credentials());
    let context = AuthContext::new(store.clone());
    let api = FakeAuthApi::default();
    assert!(context.hydrate(&api).await.is_ok());

    let relogin = context
        .login(
            &api,
            &LoginCredentials {
                email: "asha@example.com".to_owned(),
                password: "correct".to_owned(),
            },
        )
        .await;
    assert!(relogin.is_ok());

    context
        .expire(&stored_credentials().token, "late 401 for the old token")
        .await;

    assert!(context.is_authenticated());
    assert_eq!(
        context
            .require_session()
            .map(|session| session.token().expose().to_owned())
            .ok(),
        Some("fresh-token".to_owned())
    );
    assert!(store.stored.lock().await.is_some());
}
