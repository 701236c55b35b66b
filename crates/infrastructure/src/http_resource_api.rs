use std::sync::Arc;

use async_trait::async_trait;
use samsoft_application::{MutationOutcome, ResourceApi, ResourcePayload};
use samsoft_core::AppResult;
use samsoft_domain::{ListQuery, ListResult, RecordId, ResourceKind, ResourceRecord};
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope;
use crate::http_api_client::{HttpApiClient, RequestIdentity};
use crate::resource_endpoints::ResourceEndpoints;

/// [`ResourceApi`] over the REST backend.
#[derive(Clone)]
pub struct HttpResourceApi {
    client: Arc<HttpApiClient>,
}

impl HttpResourceApi {
    /// Creates the adapter over a shared client.
    #[must_use]
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }

    async fn mutate(
        &self,
        kind: ResourceKind,
        path: String,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome> {
        let endpoints = ResourceEndpoints::for_kind(kind);
        let body = if payload.has_attachments() {
            self.client
                .post_multipart(
                    path.as_str(),
                    payload.fields,
                    &payload.attachments,
                    RequestIdentity::Session,
                    endpoints.sends_user_id(),
                )
                .await?
        } else {
            self.client
                .post_json(
                    path.as_str(),
                    payload.fields,
                    RequestIdentity::Session,
                    endpoints.sends_user_id(),
                )
                .await?
        };

        Ok(MutationOutcome {
            message: envelope::message(&body),
            record: envelope::echoed_record(&body, endpoints.singular_key()),
        })
    }

    fn id_body(endpoints: &ResourceEndpoints, id: &RecordId) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(endpoints.id_param().to_owned(), id.to_json());
        body
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list(
        &self,
        kind: ResourceKind,
        query: &ListQuery,
    ) -> AppResult<ListResult<ResourceRecord>> {
        let endpoints = ResourceEndpoints::for_kind(kind);
        let body = self
            .client
            .post_json(
                endpoints.list_path().as_str(),
                query.to_request_body(),
                RequestIdentity::Session,
                endpoints.sends_user_id(),
            )
            .await?;

        let result = envelope::list_result(body, endpoints.plural_key(), query)?;
        debug!(
            resource = %kind,
            items = result.items.len(),
            total_records = result.pagination.total_records(),
            "list page received"
        );
        Ok(result)
    }

    async fn get(&self, kind: ResourceKind, id: &RecordId) -> AppResult<ResourceRecord> {
        let endpoints = ResourceEndpoints::for_kind(kind);
        let body = self
            .client
            .post_json(
                endpoints.get_path().as_str(),
                Self::id_body(&endpoints, id),
                RequestIdentity::Session,
                endpoints.sends_user_id(),
            )
            .await?;

        envelope::single_record(body, endpoints.singular_key())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome> {
        let path = ResourceEndpoints::for_kind(kind).create_path();
        self.mutate(kind, path, payload).await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &RecordId,
        mut payload: ResourcePayload,
    ) -> AppResult<MutationOutcome> {
        let endpoints = ResourceEndpoints::for_kind(kind);
        payload
            .fields
            .insert(endpoints.id_param().to_owned(), id.to_json());
        self.mutate(kind, endpoints.update_path(), payload).await
    }

    async fn delete(&self, kind: ResourceKind, id: &RecordId) -> AppResult<()> {
        let endpoints = ResourceEndpoints::for_kind(kind);
        self.client
            .post_json(
                endpoints.delete_path().as_str(),
                Self::id_body(&endpoints, id),
                RequestIdentity::Session,
                endpoints.sends_user_id(),
            )
            .await?;

        Ok(())
    }
}
