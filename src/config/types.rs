use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "baseUrl")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build flavour of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkMode {
    /// Always fetch from the backend.
    #[default]
    #[serde(alias = "DEBUG")]
    Debug,
    /// Seed from the bundled snapshot on first start.
    #[serde(alias = "RELEASE")]
    Release,
    #[serde(alias = "HYBRID")]
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdkConfig {
    /// Backend root, e.g. `https://app.tolgee.io`
    pub base_url: String,
    pub api_key: String,
    pub mode: SdkMode,

    /// Bundled snapshot, read only in release mode.
    pub preload_path: Option<PathBuf>,

    /// Where preferences are stored. In-memory when unset.
    pub preferences_path: Option<PathBuf>,

    /// Keys per page when fetching translations.
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            mode: SdkMode::default(),
            preload_path: None,
            preferences_path: None,
            page_size: 20,
            request_timeout_secs: 30,
        }
    }
}

impl SdkConfig {
    /// # Errors
    /// - Required field is empty
    /// - Invalid base URL
    /// - Zero page size or timeout
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.base_url.trim().is_empty() {
            errors.push(ValidationError::new(
                "baseUrl",
                "The backend URL is required. Example: \"https://app.tolgee.io\"",
            ));
        } else if let Err(e) = url::Url::parse(&self.base_url) {
            errors.push(ValidationError::new(
                "baseUrl",
                format!("Invalid URL '{}': {e}", self.base_url),
            ));
        }

        if self.api_key.trim().is_empty() {
            errors.push(ValidationError::new("apiKey", "The API key is required"));
        }

        if self.page_size == 0 {
            errors.push(ValidationError::new("pageSize", "The page size must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "requestTimeoutSecs",
                "The timeout must be at least 1 second",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
