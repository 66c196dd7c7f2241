//! ホストアプリから設定を組み立てるビルダー

use std::path::PathBuf;

use super::{
    ConfigError,
    SdkConfig,
    SdkMode,
};

#[derive(Debug, Clone, Default)]
pub struct SdkConfigBuilder {
    config: SdkConfig,
}

impl SdkConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: SdkMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use]
    pub fn preload_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.preload_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.preferences_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// # Errors
    /// 必須項目の欠落や不正値があれば `ConfigError::ValidationErrors`
    pub fn build(self) -> Result<SdkConfig, ConfigError> {
        self.config.validate().map_err(ConfigError::ValidationErrors)?;
        Ok(self.config)
    }
}
