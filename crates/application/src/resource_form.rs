mod preview_registry;

use samsoft_core::AppError;
use samsoft_domain::{
    AppRoute, FileUploadPolicy, RecordId, ResourceKind, ResourceRecord, SIGNATURE_PROBE_LEN,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{Attachment, Notice, ResourceApi, ResourcePayload};

pub use preview_registry::{PreviewHandle, PreviewRegistry};

/// Whether the form creates a record or edits one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New record.
    Create,
    /// Existing record.
    Update(RecordId),
}

/// File picked by the user, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentCandidate {
    /// Original file name.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// File refused by the upload policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    /// Original file name.
    pub file_name: String,
    /// Why it was refused, naming the file.
    pub reason: String,
}

/// Result of adding picked files to the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOutcome {
    /// Names of files appended to the attachment list.
    pub accepted: Vec<String>,
    /// Files left out.
    pub rejected: Vec<RejectedFile>,
}

impl AttachOutcome {
    /// Error modal naming every rejected file, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        if self.rejected.is_empty() {
            return None;
        }

        let details = self
            .rejected
            .iter()
            .map(|file| file.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Some(Notice::error(format!(
            "The following files were not added: {details}"
        )))
    }
}

/// How a submit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; show the notice, then navigate.
    Submitted {
        /// Success modal.
        notice: Notice,
        /// List screen of the resource.
        redirect_to: AppRoute,
    },
    /// Not saved; the form keeps its input.
    Rejected {
        /// Error modal.
        notice: Notice,
    },
}

struct FormAttachment {
    attachment: Attachment,
    preview: Option<PreviewHandle>,
}

/// Create/update form for one resource.
pub struct ResourceForm {
    kind: ResourceKind,
    mode: FormMode,
    fields: Map<String, Value>,
    required: Vec<String>,
    policy: FileUploadPolicy,
    attachments: Vec<FormAttachment>,
    previews: PreviewRegistry,
}

impl ResourceForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        mode: FormMode,
        policy: FileUploadPolicy,
        previews: PreviewRegistry,
    ) -> Self {
        Self {
            kind,
            mode,
            fields: Map::new(),
            required: Vec::new(),
            policy,
            attachments: Vec::new(),
            previews,
        }
    }

    /// Creates an edit form pre-filled from a fetched record.
    pub fn for_record(
        kind: ResourceKind,
        record: &ResourceRecord,
        policy: FileUploadPolicy,
        previews: PreviewRegistry,
    ) -> Result<Self, AppError> {
        let id = record.id().ok_or_else(|| {
            AppError::Validation(format!("{} record has no id", kind.label()))
        })?;

        let mut form = Self::new(kind, FormMode::Update(id), policy, previews);
        form.fields = record.fields().clone();
        Ok(form)
    }

    /// Marks fields that must be filled before submitting.
    #[must_use]
    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required
            .extend(fields.iter().map(|field| (*field).to_owned()));
        self
    }

    /// Returns the form mode.
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Sets one field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Returns one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns required fields that are missing or blank.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|name| match self.fields.get(name.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(text)) => text.trim().is_empty(),
                Some(_) => false,
            })
            .map(String::as_str)
            .collect()
    }

    /// Validates picked files and appends the valid ones to the existing list.
    pub fn attach(&mut self, candidates: Vec<AttachmentCandidate>) -> AttachOutcome {
        let mut outcome = AttachOutcome::default();

        for candidate in candidates {
            let size = u64::try_from(candidate.content.len()).unwrap_or(u64::MAX);
            let head = candidate
                .content
                .get(..SIGNATURE_PROBE_LEN)
                .unwrap_or(candidate.content.as_slice());

            match self
                .policy
                .validate(candidate.file_name.as_str(), size, head)
            {
                Ok(kind) => {
                    let preview = kind
                        .is_image()
                        .then(|| self.previews.create(candidate.file_name.as_str()));
                    outcome.accepted.push(candidate.file_name.clone());
                    self.attachments.push(FormAttachment {
                        attachment: Attachment {
                            file_name: candidate.file_name,
                            kind,
                            content: candidate.content,
                        },
                        preview,
                    });
                }
                Err(error) => {
                    warn!(
                        resource = %self.kind,
                        file_name = %candidate.file_name,
                        error = %error,
                        "attachment rejected"
                    );
                    outcome.rejected.push(RejectedFile {
                        file_name: candidate.file_name,
                        reason: error.user_message(),
                    });
                }
            }
        }

        outcome
    }

    /// Returns the queued file names in order.
    #[must_use]
    pub fn attachment_names(&self) -> Vec<&str> {
        self.attachments
            .iter()
            .map(|entry| entry.attachment.file_name.as_str())
            .collect()
    }

    /// Returns the preview URL of a queued file, if it has one.
    #[must_use]
    pub fn preview_url(&self, index: usize) -> Option<&str> {
        self.attachments
            .get(index)
            .and_then(|entry| entry.preview.as_ref())
            .map(PreviewHandle::url)
    }

    /// Removes one queued file and revokes its preview.
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.attachments.len() {
            return None;
        }

        let entry = self.attachments.remove(index);
        if let Some(preview) = entry.preview.as_ref() {
            self.previews.revoke(preview);
        }
        Some(entry.attachment)
    }

    /// Removes every queued file and revokes their previews.
    pub fn clear_attachments(&mut self) {
        for entry in self.attachments.drain(..) {
            if let Some(preview) = entry.preview.as_ref() {
                self.previews.revoke(preview);
            }
        }
    }

    /// Validates and sends the form. JSON without files, multipart with files.
    pub async fn submit(&self, api: &dyn ResourceApi) -> SubmitOutcome {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return SubmitOutcome::Rejected {
                notice: Notice::error(format!(
                    "Please fill in the required fields: {}",
                    missing.join(", ")
                )),
            };
        }

        let payload = ResourcePayload {
            fields: self.fields.clone(),
            attachments: self
                .attachments
                .iter()
                .map(|entry| entry.attachment.clone())
                .collect(),
        };
        let attachment_count = payload.attachments.len();

        let (result, verb) = match &self.mode {
            FormMode::Create => (api.create(self.kind, payload).await, "created"),
            FormMode::Update(id) => (api.update(self.kind, id, payload).await, "updated"),
        };

        match result {
            Ok(outcome) => {
                info!(resource = %self.kind, attachment_count, "record {verb}");
                let message = outcome
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| format!("{} {verb} successfully.", self.kind.label()));
                SubmitOutcome::Submitted {
                    notice: Notice::success(message),
                    redirect_to: AppRoute::List(self.kind),
                }
            }
            Err(error) => {
                warn!(resource = %self.kind, error = %error, "record submit failed");
                SubmitOutcome::Rejected {
                    notice: Notice::from_error(&error),
                }
            }
        }
    }
}

impl Drop for ResourceForm {
    fn drop(&mut self) {
        self.clear_attachments();
    }
}

#[cfg(test)]
mod tests;
