//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod attachment_reader;
mod credential_store;
mod envelope;
mod http_api_client;
mod http_auth_api;
mod http_resource_api;
mod resource_endpoints;

pub use attachment_reader::read_attachment;
pub use credential_store::{InMemoryCredentialStore, JsonFileCredentialStore};
pub use http_api_client::{HttpApiClient, RequestIdentity};
pub use http_auth_api::HttpAuthApi;
pub use http_resource_api::HttpResourceApi;
pub use resource_endpoints::ResourceEndpoints;
