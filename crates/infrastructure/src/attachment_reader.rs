use std::path::Path;

use samsoft_application::AttachmentCandidate;
use samsoft_core::{AppError, AppResult};

/// Reads a local file into an attachment candidate named after the file.
pub async fn read_attachment(path: impl AsRef<Path>) -> AppResult<AttachmentCandidate> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!("'{}' does not name a file", path.display()))
        })?
        .to_owned();

    let content = tokio::fs::read(path).await.map_err(|error| match error.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("file '{}' does not exist", path.display()))
        }
        _ => AppError::Internal(format!("failed to read '{}': {error}", path.display())),
    })?;

    Ok(AttachmentCandidate { file_name, content })
}
