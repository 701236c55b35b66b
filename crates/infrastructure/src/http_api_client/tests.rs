use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use samsoft_application::{
    Attachment, AuthContext, CredentialStore, LoadingIndicator, LoginCredentials,
    PersistedCredentials, ResourceApi, ResourcePayload,
};
use samsoft_core::{AccessToken, AppError, PrincipalId};
use samsoft_domain::{FileKind, ListQuery, RecordId, ResourceKind, SessionState};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use url::Url;

use crate::{HttpApiClient, HttpAuthApi, HttpResourceApi, InMemoryCredentialStore};

#[derive(Debug, Clone)]
struct CapturedRequest {
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct TestBackend {
    requests: Mutex<Vec<CapturedRequest>>,
}

async fn handle(
    State(backend): State<Arc<TestBackend>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let captured = CapturedRequest {
        path: uri.path().to_owned(),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: body.to_vec(),
    };
    let request = captured.json();
    let bearer_ok = captured.authorization.as_deref() == Some("Bearer tok-abc");
    backend.requests.lock().await.push(captured.clone());
    let issued_token = if request["email"] == "second@example.com" {
        "tok-second"
    } else {
        "tok-abc"
    };

    match captured.path.as_str() {
        "/api/auth/login" if request["password"] == "wrong" => Json(json!({
            "success": false,
            "message": "Invalid email or password"
        }))
        .into_response(),
        "/api/auth/login" => Json(json!({
            "success": true,
            "data": {
                "token": issued_token,
                "user": {"id": 42, "name": "Ada", "is_client_admin": false},
                "permissions": {"department": {"view": true, "delete": true}}
            }
        }))
        .into_response(),
        "/api/auth/profile" if bearer_ok => Json(json!({
            "success": true,
            "data": {"name": "Ada", "permissions": {"department": {"view": true}}}
        }))
        .into_response(),
        "/api/auth/logout" => Json(json!({"success": true})).into_response(),
        "/api/departments/list" if bearer_ok => {
            let page = request["page"].as_u64().unwrap_or(1);
            Json(json!({
                "success": true,
                "data": [{"id": page * 10 + 1, "name": "Finance"}],
                "pagination": {
                    "current_page": page,
                    "page_size": request["page_size"],
                    "total_records": 23,
                    "total_pages": 3,
                    "has_next": page < 3,
                    "has_previous": page > 1
                }
            }))
            .into_response()
        }
        "/api/departments/delete" if request["id"] == 3 => Json(json!({
            "success": false,
            "message": "Department is in use"
        }))
        .into_response(),
        "/api/departments/delete" => Json(json!({"success": true})).into_response(),
        "/api/documents/create" => Json(json!({
            "success": true,
            "message": "Document uploaded",
            "data": {"id": 5, "title": "Policy"}
        }))
        .into_response(),
        "/api/shifts/list" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "token expired"})),
            )
                .into_response()
        }
        "/api/auth/profile" | "/api/departments/list" | "/api/tickets/list" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "token expired"})),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "no route"}))).into_response(),
    }
}

async fn start_backend() -> (SocketAddr, Arc<TestBackend>) {
    let backend = Arc::new(TestBackend::default());
    let app = Router::new()
        .fallback(handle)
        .with_state(Arc::clone(&backend));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
    assert!(listener.is_ok());
    let listener = listener.unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr();
    assert!(address.is_ok());
    let address = address.unwrap_or_else(|_| unreachable!());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (address, backend)
}

struct Harness {
    auth: AuthContext,
    loading: LoadingIndicator,
    store: Arc<InMemoryCredentialStore>,
    auth_api: HttpAuthApi,
    resources: HttpResourceApi,
}

fn harness(address: SocketAddr, store: InMemoryCredentialStore) -> Harness {
    let store = Arc::new(store);
    let auth = AuthContext::new(store.clone());
    let loading = LoadingIndicator::new();
    let base_url = Url::parse(format!("http://{address}").as_str());
    assert!(base_url.is_ok());

    let client = HttpApiClient::new(
        base_url.unwrap_or_else(|_| unreachable!()),
        Duration::from_secs(5),
        auth.clone(),
        loading.clone(),
    );
    assert!(client.is_ok());
    let client = Arc::new(client.unwrap_or_else(|_| unreachable!()));

    Harness {
        auth,
        loading,
        store,
        auth_api: HttpAuthApi::new(Arc::clone(&client)),
        resources: HttpResourceApi::new(client),
    }
}

fn login_credentials(password: &str) -> LoginCredentials {
    LoginCredentials {
        email: "ada@example.com".to_owned(),
        password: password.to_owned(),
    }
}

async fn signed_in(address: SocketAddr) -> Harness {
    let harness = harness(address, InMemoryCredentialStore::new());
    let session = harness
        .auth
        .login(&harness.auth_api, &login_credentials("secret"))
        .await;
    assert!(session.is_ok());
    harness
}

#[tokio::test]
async fn list_sends_bearer_and_normalises_envelope() {
    let (address, backend) = start_backend().await;
    let harness = signed_in(address).await;

    let result = harness
        .resources
        .list(ResourceKind::Department, &ListQuery::new().with_page(2))
        .await;
    assert!(result.is_ok());
    let result = result.unwrap_or_else(|_| unreachable!());

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.pagination.current_page(), 2);
    assert_eq!(result.pagination.total_pages(), 3);
    assert_eq!(result.pagination.summary(), "Showing 11 to 20 of 23 entries");
    assert_eq!(harness.loading.active_requests(), 0);

    let requests = backend.requests.lock().await;
    let list = requests
        .iter()
        .find(|request| request.path == "/api/departments/list");
    assert!(list.is_some());
    let list = list.unwrap_or_else(|| unreachable!());
    assert_eq!(list.authorization.as_deref(), Some("Bearer tok-abc"));
    assert_eq!(list.json()["page"], 2);
    assert_eq!(list.json()["page_size"], 10);
}

#[tokio::test]
async fn login_persists_credentials() {
    let (address, _backend) = start_backend().await;
    let harness = signed_in(address).await;

    let stored = harness.store.load().await;

    assert!(matches!(
        stored,
        Ok(Some(ref credentials))
            if credentials.principal_id.as_str() == "42" && credentials.token.expose() == "tok-abc"
    ));
    assert!(harness.auth.is_authenticated());
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let (address, _backend) = start_backend().await;
    let harness = harness(address, InMemoryCredentialStore::new());

    let result = harness
        .auth
        .login(&harness.auth_api, &login_credentials("wrong"))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Server { message: Some(ref message) })
            if message == "Invalid email or password"
    ));
    assert!(!harness.auth.is_authenticated());
}

#[tokio::test]
async fn hydrate_restores_session_from_persisted_credentials() {
    let (address, backend) = start_backend().await;
    let store = InMemoryCredentialStore::with_credentials(PersistedCredentials {
        principal_id: PrincipalId::new("42").unwrap_or_else(|_| unreachable!()),
        token: AccessToken::new("tok-abc").unwrap_or_else(|_| unreachable!()),
    });
    let harness = harness(address, store);

    let state = harness.auth.hydrate(&harness.auth_api).await;

    assert!(matches!(state, Ok(SessionState::Authenticated(ref session))
        if session.display_name() == Some("Ada")));

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/auth/profile");
    assert_eq!(requests[0].json()["user_id"], "42");
}

#[tokio::test]
async fn hydrate_with_stale_token_clears_storage() {
    let (address, _backend) = start_backend().await;
    let store = InMemoryCredentialStore::with_credentials(PersistedCredentials {
        principal_id: PrincipalId::new("42").unwrap_or_else(|_| unreachable!()),
        token: AccessToken::new("tok-old").unwrap_or_else(|_| unreachable!()),
    });
    let harness = harness(address, store);

    let state = harness.auth.hydrate(&harness.auth_api).await;

    assert!(matches!(state, Ok(SessionState::Unauthenticated)));
    assert!(matches!(harness.store.load().await, Ok(None)));
}

#[tokio::test]
async fn unauthorized_response_expires_the_session() {
    let (address, _backend) = start_backend().await;
    let harness = signed_in(address).await;

    let result = harness
        .resources
        .list(ResourceKind::Ticket, &ListQuery::new())
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(matches!(harness.auth.state(), SessionState::Unauthenticated));
    assert!(matches!(harness.store.load().await, Ok(None)));
}

#[tokio::test]
async fn late_unauthorized_response_keeps_newer_login() {
    let (address, _backend) = start_backend().await;
    let harness = signed_in(address).await;

    let query = ListQuery::new();
    let (result, relogin) = tokio::join!(
        harness.resources.list(ResourceKind::Shift, &query),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            harness
                .auth
                .login(
                    &harness.auth_api,
                    &LoginCredentials {
                        email: "second@example.com".to_owned(),
                        password: "secret".to_owned(),
                    },
                )
                .await
        }
    );

    assert!(relogin.is_ok());
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    let session = harness.auth.require_session();
    assert!(matches!(session, Ok(ref session) if session.token().expose() == "tok-second"));
    assert!(matches!(
        harness.store.load().await,
        Ok(Some(ref credentials)) if credentials.token.expose() == "tok-second"
    ));
}

#[tokio::test]
async fn missing_session_fails_before_sending() {
    let (address, backend) = start_backend().await;
    let harness = harness(address, InMemoryCredentialStore::new());

    let result = harness
        .resources
        .list(ResourceKind::Department, &ListQuery::new())
        .await;

    assert!(matches!(result, Err(ref error) if error.is_preflight()));
    assert!(backend.requests.lock().await.is_empty());
}

#[tokio::test]
async fn failure_flag_becomes_server_error() {
    let (address, _backend) = start_backend().await;
    let harness = signed_in(address).await;
    let id = RecordId::new("3").unwrap_or_else(|_| unreachable!());

    let result = harness.resources.delete(ResourceKind::Department, &id).await;

    assert!(matches!(
        result,
        Err(AppError::Server { message: Some(ref message) }) if message == "Department is in use"
    ));
}

#[tokio::test]
async fn attachments_go_out_as_multipart_with_user_id() {
    let (address, backend) = start_backend().await;
    let harness = signed_in(address).await;
    let mut fields = Map::new();
    fields.insert("title".to_owned(), json!("Policy"));
    let payload = ResourcePayload {
        fields,
        attachments: vec![Attachment {
            file_name: "policy.pdf".to_owned(),
            kind: FileKind::Pdf,
            content: b"%PDF-1.7\n".to_vec(),
        }],
    };

    let outcome = harness
        .resources
        .create(ResourceKind::CompanyDocument, payload)
        .await;
    assert!(outcome.is_ok());
    let outcome = outcome.unwrap_or_else(|_| unreachable!());
    assert_eq!(outcome.message.as_deref(), Some("Document uploaded"));
    assert!(outcome.record.is_some());

    let requests = backend.requests.lock().await;
    let upload = requests
        .iter()
        .find(|request| request.path == "/api/documents/create");
    assert!(upload.is_some());
    let upload = upload.unwrap_or_else(|| unreachable!());
    assert!(
        upload
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("multipart/form-data"))
    );
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("filename=\"policy.pdf\""));
    assert!(body.contains("name=\"user_id\""));
    assert!(body.contains("application/pdf"));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
    assert!(listener.is_ok());
    let listener = listener.unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
    drop(listener);

    let harness = harness(address, InMemoryCredentialStore::new());
    let result = harness
        .auth
        .login(&harness.auth_api, &login_credentials("secret"))
        .await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert_eq!(harness.loading.active_requests(), 0);
    assert!(!harness.loading.is_visible());
}

#[tokio::test]
async fn logout_clears_local_state() {
    let (address, backend) = start_backend().await;
    let harness = signed_in(address).await;

    assert!(harness.auth.logout(&harness.auth_api).await.is_ok());

    assert!(matches!(harness.auth.state(), SessionState::Unauthenticated));
    assert!(matches!(harness.store.load().await, Ok(None)));
    let requests = backend.requests.lock().await;
    assert!(requests.iter().any(|request| request.path == "/api/auth/logout"
        && request.authorization.as_deref() == Some("Bearer tok-abc")));
}
