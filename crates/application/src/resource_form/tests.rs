use async_trait::async_trait;
use samsoft_core::{AppError, AppResult, GENERIC_FAILURE_MESSAGE};
use samsoft_domain::{
    AppRoute, FileKind, FileUploadPolicy, ListQuery, ListResult, RecordId, ResourceKind,
    ResourceRecord,
};
use serde_json::json;
use tokio::sync::Mutex;

use crate::{MutationOutcome, NoticeKind, ResourceApi, ResourcePayload};

use super::{AttachmentCandidate, FormMode, PreviewRegistry, ResourceForm, SubmitOutcome};

#[derive(Default)]
struct RecordingResourceApi {
    created: Mutex<Vec<ResourcePayload>>,
    updated: Mutex<Vec<(RecordId, ResourcePayload)>>,
    server_failure: bool,
    message: Option<String>,
}

impl RecordingResourceApi {
    fn outcome(&self) -> AppResult<MutationOutcome> {
        if self.server_failure {
            return Err(AppError::server(None));
        }

        Ok(MutationOutcome {
            message: self.message.clone(),
            record: None,
        })
    }
}

#[async_trait]
impl ResourceApi for RecordingResourceApi {
    async fn list(
        &self,
        _kind: ResourceKind,
        query: &ListQuery,
    ) -> AppResult<ListResult<ResourceRecord>> {
        Ok(ListResult::empty(query.page_size()))
    }

    async fn get(&self, _kind: ResourceKind, id: &RecordId) -> AppResult<ResourceRecord> {
        Err(AppError::NotFound(id.to_string()))
    }

    async fn create(
        &self,
        _kind: ResourceKind,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome> {
        self.created.lock().await.push(payload);
        self.outcome()
    }

    async fn update(
        &self,
        _kind: ResourceKind,
        id: &RecordId,
        payload: ResourcePayload,
    ) -> AppResult<MutationOutcome> {
        self.updated.lock().await.push((id.clone(), payload));
        self.outcome()
    }

    async fn delete(&self, _kind: ResourceKind, _id: &RecordId) -> AppResult<()> {
        Ok(())
    }
}

fn candidate(file_name: &str, content: &[u8]) -> AttachmentCandidate {
    AttachmentCandidate {
        file_name: file_name.to_owned(),
        content: content.to_vec(),
    }
}

fn png_bytes() -> Vec<u8> {
    let mut content = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    content.extend_from_slice(&[0; 16]);
    content
}

fn document_form(previews: &PreviewRegistry) -> ResourceForm {
    ResourceForm::new(
        ResourceKind::CompanyDocument,
        FormMode::Create,
        FileUploadPolicy::default(),
        previews.clone(),
    )
    .require(&["title"])
}

#[tokio::test]
async fn only_files_passing_the_signature_check_are_uploaded() {
    let api = RecordingResourceApi::default();
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);
    form.set_field("title", json!("Handbook"));

    let outcome = form.attach(vec![
        candidate("handbook.pdf", b"%PDF-1.7\nbody"),
        candidate("fake.pdf", b"MZ\x90\x00not a pdf"),
    ]);

    assert_eq!(outcome.accepted, vec!["handbook.pdf".to_owned()]);
    assert_eq!(outcome.rejected.len(), 1);
    let notice = outcome.notice();
    assert!(notice.is_some());
    let notice = notice.unwrap_or_else(|| unreachable!());
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.message.contains("fake.pdf"));

    let submitted = form.submit(&api).await;
    assert!(matches!(submitted, SubmitOutcome::Submitted { .. }));

    let created = api.created.lock().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].attachments.len(), 1);
    assert_eq!(created[0].attachments[0].file_name, "handbook.pdf");
    assert_eq!(created[0].attachments[0].kind, FileKind::Pdf);
}

#[test]
fn oversized_file_is_rejected_against_the_cap() {
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);

    let mut content = b"%PDF-1.7\n".to_vec();
    content.resize(6_000_000, 0);
    let outcome = form.attach(vec![candidate("big.pdf", &content)]);

    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.rejected.len(), 1);
    assert!(outcome.rejected[0].reason.contains("big.pdf"));
    assert!(form.attachment_names().is_empty());
}

#[test]
fn attach_appends_to_previous_selection() {
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);

    let first = form.attach(vec![candidate("a.pdf", b"%PDF-1.4")]);
    let second = form.attach(vec![candidate("b.png", &png_bytes())]);

    assert!(first.notice().is_none());
    assert!(second.notice().is_none());
    assert_eq!(form.attachment_names(), vec!["a.pdf", "b.png"]);
    assert!(form.preview_url(0).is_none());
    assert!(form.preview_url(1).is_some());
}

#[test]
fn removing_an_image_revokes_its_preview() {
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);
    form.attach(vec![
        candidate("one.png", &png_bytes()),
        candidate("two.png", &png_bytes()),
    ]);
    assert_eq!(previews.live_count(), 2);

    let removed = form.remove_attachment(0);

    assert!(removed.is_some());
    assert_eq!(previews.live_count(), 1);
    assert_eq!(form.attachment_names(), vec!["two.png"]);
    assert!(form.remove_attachment(5).is_none());
}

#[test]
fn dropping_the_form_revokes_outstanding_previews() {
    let previews = PreviewRegistry::new();
    {
        let mut form = document_form(&previews);
        form.attach(vec![
            candidate("one.png", &png_bytes()),
            candidate("two.gif", b"GIF89a\x01\x00"),
        ]);
        assert_eq!(previews.live_count(), 2);
    }

    assert_eq!(previews.live_count(), 0);
}

#[tokio::test]
async fn missing_required_fields_block_the_request() {
    let api = RecordingResourceApi::default();
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);
    form.set_field("title", json!("   "));

    let outcome = form.submit(&api).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected { ref notice } if notice.message.contains("title")
    ));
    assert!(api.created.lock().await.is_empty());
}

#[tokio::test]
async fn failed_submit_keeps_the_form_populated() {
    let api = RecordingResourceApi {
        server_failure: true,
        ..RecordingResourceApi::default()
    };
    let previews = PreviewRegistry::new();
    let mut form = document_form(&previews);
    form.set_field("title", json!("Handbook"));
    form.attach(vec![candidate("logo.png", &png_bytes())]);

    let outcome = form.submit(&api).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected { ref notice } if notice.message == GENERIC_FAILURE_MESSAGE
    ));
    assert_eq!(form.field("title"), Some(&json!("Handbook")));
    assert_eq!(form.attachment_names(), vec!["logo.png"]);
    assert_eq!(previews.live_count(), 1);
}

#[tokio::test]
async fn successful_update_redirects_to_the_list() {
    let api = RecordingResourceApi {
        message: Some("Department updated.".to_owned()),
        ..RecordingResourceApi::default()
    };
    let record = ResourceRecord::from_value(json!({"id": 7, "name": "Finance"}));
    assert!(record.is_ok());
    let record = record.unwrap_or_else(|_| unreachable!());

    let form = ResourceForm::for_record(
        ResourceKind::Department,
        &record,
        FileUploadPolicy::default(),
        PreviewRegistry::new(),
    );
    assert!(form.is_ok());
    let mut form = form.unwrap_or_else(|_| unreachable!()).require(&["name"]);
    form.set_field("name", json!("Finance & Ops"));

    let outcome = form.submit(&api).await;

    match outcome {
        SubmitOutcome::Submitted {
            notice,
            redirect_to,
        } => {
            assert_eq!(notice.kind, NoticeKind::Success);
            assert_eq!(notice.message, "Department updated.");
            assert_eq!(redirect_to, AppRoute::List(ResourceKind::Department));
        }
        SubmitOutcome::Rejected { .. } => unreachable!(),
    }

    let updated = api.updated.lock().await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0.as_str(), "7");
    assert!(!updated[0].1.has_attachments());
}

#[test]
fn record_without_id_cannot_be_edited() {
    let record = ResourceRecord::from_value(json!({"name": "Orphan"}));
    assert!(record.is_ok());
    let record = record.unwrap_or_else(|_| unreachable!());

    let form = ResourceForm::for_record(
        ResourceKind::Department,
        &record,
        FileUploadPolicy::default(),
        PreviewRegistry::new(),
    );

    assert!(matches!(form, Err(AppError::Validation(_))));
}
