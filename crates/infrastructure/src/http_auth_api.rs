use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use samsoft_application::{AuthApi, AuthenticatedProfile, LoginCredentials, PersistedCredentials};
use samsoft_core::{AccessToken, AppError, AppResult, PrincipalId};
use samsoft_domain::{PermissionMatrix, Session};
use serde_json::{Map, Value};
use tracing::info;

use crate::http_api_client::{HttpApiClient, RequestIdentity};

const LOGIN_PATH: &str = "/api/auth/login";
const PROFILE_PATH: &str = "/api/auth/profile";
const LOGOUT_PATH: &str = "/api/auth/logout";

/// [`AuthApi`] over the REST backend.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: Arc<HttpApiClient>,
}

impl HttpAuthApi {
    /// Creates the adapter over a shared client.
    #[must_use]
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<AuthenticatedProfile> {
        let mut body = Map::new();
        body.insert("email".to_owned(), Value::from(credentials.email.trim()));
        body.insert(
            "password".to_owned(),
            Value::from(credentials.password.as_str()),
        );

        let response = self
            .client
            .post_json(LOGIN_PATH, body, RequestIdentity::Anonymous, false)
            .await?;
        let profile = parse_profile(&response, None)?;
        info!(principal_id = %profile.principal_id, "login accepted by backend");
        Ok(profile)
    }

    async fn profile(&self, credentials: &PersistedCredentials) -> AppResult<AuthenticatedProfile> {
        let response = self
            .client
            .post_json(
                PROFILE_PATH,
                Map::new(),
                RequestIdentity::Explicit(credentials),
                true,
            )
            .await?;

        parse_profile(&response, Some(credentials))
    }

    async fn logout(&self, session: &Session) -> AppResult<()> {
        let credentials = PersistedCredentials {
            principal_id: session.principal_id().clone(),
            token: session.token().clone(),
        };
        self.client
            .post_json(
                LOGOUT_PATH,
                Map::new(),
                RequestIdentity::Explicit(&credentials),
                true,
            )
            .await?;

        Ok(())
    }
}

/// Builds a profile from a login or profile envelope.
///
/// The user object may sit under `data`, `data.user` or `user`; identity and
/// token fields are accepted under their legacy names. `known` fills in what
/// a profile response omits.
pub(crate) fn parse_profile(
    body: &Value,
    known: Option<&PersistedCredentials>,
) -> AppResult<AuthenticatedProfile> {
    let data = body.get("data").filter(|value| value.is_object());
    let user = data
        .and_then(|data| data.get("user"))
        .or_else(|| body.get("user"))
        .filter(|value| value.is_object())
        .or(data)
        .unwrap_or(body);

    let scopes = [Some(user), data, Some(body)];

    let principal_id = {
        let candidates: Vec<Option<String>> = scopes
            .iter()
            .flatten()
            .flat_map(|scope| {
                ["user_id", "userId", "id"]
                    .into_iter()
                    .map(move |key| scope.get(key).and_then(scalar_text))
            })
            .collect();
        PrincipalId::resolve(candidates.iter().map(Option::as_deref))
            .or_else(|| known.map(|credentials| credentials.principal_id.clone()))
            .ok_or_else(|| {
                AppError::Internal("authentication response did not include a user id".to_owned())
            })?
    };

    let token = scopes
        .iter()
        .flatten()
        .flat_map(|scope| {
            ["token", "access_token"]
                .into_iter()
                .filter_map(move |key| scope.get(key).and_then(Value::as_str))
        })
        .find(|token| !token.trim().is_empty())
        .map(AccessToken::new)
        .transpose()?
        .or_else(|| known.map(|credentials| credentials.token.clone()))
        .ok_or_else(|| {
            AppError::Internal("authentication response did not include a token".to_owned())
        })?;

    Ok(AuthenticatedProfile {
        principal_id,
        token,
        display_name: display_name(user),
        is_client_admin: is_client_admin(user, data),
        permissions: scopes
            .iter()
            .flatten()
            .find_map(|scope| scope.get("permissions"))
            .map(permission_matrix)
            .unwrap_or_default(),
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn display_name(user: &Value) -> Option<String> {
    let field = |key: &str| {
        user.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    };

    ["name", "full_name"]
        .into_iter()
        .find_map(field)
        .map(str::to_owned)
        .or_else(|| {
            let joined = [field("first_name"), field("last_name")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        })
        .or_else(|| field("email").map(str::to_owned))
}

fn is_client_admin(user: &Value, data: Option<&Value>) -> bool {
    let flag = [Some(user), data]
        .into_iter()
        .flatten()
        .find_map(|scope| scope.get("is_client_admin"))
        .and_then(|value| match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => Some(number.as_i64() == Some(1)),
            Value::String(text) => Some(matches!(text.as_str(), "true" | "1")),
            _ => None,
        });

    flag.unwrap_or_else(|| {
        user.get("role")
            .and_then(Value::as_str)
            .is_some_and(|role| role.eq_ignore_ascii_case("client_admin"))
    })
}

/// Accepts `{module: {action: bool}}` or `{module: [action, ...]}`.
fn permission_matrix(value: &Value) -> PermissionMatrix {
    let Some(modules) = value.as_object() else {
        return PermissionMatrix::new();
    };

    modules
        .iter()
        .map(|(module, actions)| {
            let actions: BTreeMap<String, bool> = match actions {
                Value::Object(grants) => grants
                    .iter()
                    .filter_map(|(action, allowed)| {
                        allowed.as_bool().map(|allowed| (action.clone(), allowed))
                    })
                    .collect(),
                Value::Array(granted) => granted
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|action| (action.to_owned(), true))
                    .collect(),
                _ => BTreeMap::new(),
            };
            (module.clone(), actions)
        })
        .collect()
}
