use samsoft_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default per-file upload cap (5 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Number of leading bytes needed to check every known signature.
pub const SIGNATURE_PROBE_LEN: usize = 8;

const PDF: &[u8] = &[0x25, 0x50, 0x44, 0x46];
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF: &[u8] = &[0x47, 0x49, 0x46, 0x38];
const OLE_COMPOUND: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// Upload formats recognised by extension and leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// `.pdf`
    Pdf,
    /// `.png`
    Png,
    /// `.jpg` / `.jpeg`
    Jpeg,
    /// `.gif`
    Gif,
    /// Legacy Word `.doc`
    Doc,
    /// Word `.docx`
    Docx,
    /// Legacy Excel `.xls`
    Xls,
    /// Excel `.xlsx`
    Xlsx,
}

impl FileKind {
    /// Returns all known kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FileKind] = &[
            FileKind::Pdf,
            FileKind::Png,
            FileKind::Jpeg,
            FileKind::Gif,
            FileKind::Doc,
            FileKind::Docx,
            FileKind::Xls,
            FileKind::Xlsx,
        ];

        ALL
    }

    /// Maps a file name to its kind by extension (case-insensitive).
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Returns the leading bytes every file of this kind starts with.
    #[must_use]
    pub fn signature(&self) -> &'static [u8] {
        match self {
            Self::Pdf => PDF,
            Self::Png => PNG,
            Self::Jpeg => JPEG,
            Self::Gif => GIF,
            Self::Doc | Self::Xls => OLE_COMPOUND,
            Self::Docx | Self::Xlsx => ZIP,
        }
    }

    /// Returns the MIME type sent with the multipart part.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Returns whether the form shows an inline preview for this kind.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif)
    }

    /// Returns whether `head` starts with this kind's signature.
    #[must_use]
    pub fn matches_signature(&self, head: &[u8]) -> bool {
        head.starts_with(self.signature())
    }
}

/// Size cap and allow-list applied to every selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadPolicy {
    max_bytes: u64,
    allowed: Vec<FileKind>,
}

impl Default for FileUploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed: FileKind::all().to_vec(),
        }
    }
}

impl FileUploadPolicy {
    /// Creates a policy. A zero cap is rejected.
    pub fn new(max_bytes: u64, allowed: Vec<FileKind>) -> AppResult<Self> {
        if max_bytes == 0 {
            return Err(AppError::Validation(
                "upload size cap must be greater than zero".to_owned(),
            ));
        }
        if allowed.is_empty() {
            return Err(AppError::Validation(
                "upload policy must allow at least one file type".to_owned(),
            ));
        }

        Ok(Self { max_bytes, allowed })
    }

    /// Returns the per-file cap in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Checks size, extension and leading bytes, in that order.
    pub fn validate(&self, file_name: &str, size: u64, head: &[u8]) -> AppResult<FileKind> {
        if size > self.max_bytes {
            return Err(AppError::Validation(format!(
                "'{file_name}' is {size} bytes; the limit is {} bytes",
                self.max_bytes
            )));
        }

        let kind = FileKind::from_file_name(file_name)
            .filter(|kind| self.allowed.contains(kind))
            .ok_or_else(|| {
                AppError::Validation(format!("'{file_name}' is not an allowed file type"))
            })?;

        if !kind.matches_signature(head) {
            return Err(AppError::Validation(format!(
                "'{file_name}' does not look like a valid {} file",
                file_name
                    .rsplit_once('.')
                    .map(|(_, extension)| extension.to_ascii_uppercase())
                    .unwrap_or_default()
            )));
        }

        Ok(kind)
    }
}
