use std::env;
use std::path::PathBuf;
use std::time::Duration;

use samsoft_core::{AppError, AppResult};
use samsoft_domain::{DEFAULT_MAX_UPLOAD_BYTES, FileKind, FileUploadPolicy};
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_CREDENTIALS_PATH: &str = ".samsoft/session.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: Url,
    pub credentials_path: PathBuf,
    pub request_timeout: Duration,
    pub upload_policy: FileUploadPolicy,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let raw_base_url =
            non_blank("SAMSOFT_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let api_base_url = Url::parse(raw_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!(
                "invalid SAMSOFT_API_BASE_URL '{raw_base_url}': {error}"
            ))
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "SAMSOFT_API_BASE_URL must use http or https, got '{}'",
                api_base_url.scheme()
            )));
        }

        let credentials_path = non_blank("SAMSOFT_CREDENTIALS_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from);

        let request_timeout_secs = parse_u64(
            "SAMSOFT_REQUEST_TIMEOUT_SECS",
            non_blank("SAMSOFT_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(AppError::Validation(
                "SAMSOFT_REQUEST_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        let max_upload_bytes = parse_u64(
            "SAMSOFT_MAX_UPLOAD_BYTES",
            non_blank("SAMSOFT_MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        if max_upload_bytes == 0 {
            return Err(AppError::Validation(
                "SAMSOFT_MAX_UPLOAD_BYTES must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_base_url,
            credentials_path,
            request_timeout: Duration::from_secs(request_timeout_secs),
            upload_policy: FileUploadPolicy::new(max_upload_bytes, FileKind::all().to_vec())?,
        })
    }
}

fn parse_u64(name: &str, value: Option<String>, default: u64) -> AppResult<u64> {
    match value {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
