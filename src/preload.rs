//! Bundled snapshot used to seed the cache on the very first start.

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::{
    SdkConfig,
    SdkMode,
};
use crate::error::SyncError;
use crate::storage::Statement;

#[async_trait]
pub trait PreloadSource: Send + Sync + Debug {
    async fn is_available(&self) -> bool;

    /// Storage statements in the order they must be applied.
    ///
    /// # Errors
    /// The snapshot cannot be read or parsed.
    async fn statements(&self) -> Result<Vec<Statement>, SyncError>;
}

/// No bundled snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreload;

#[async_trait]
impl PreloadSource for NoPreload {
    async fn is_available(&self) -> bool {
        false
    }

    async fn statements(&self) -> Result<Vec<Statement>, SyncError> {
        Ok(Vec::new())
    }
}

/// JSON snapshot file shipped with the host application.
///
/// Only release builds use it; debug and hybrid builds always talk to the backend.
#[derive(Debug, Clone)]
pub struct BundledPreload {
    path: Option<PathBuf>,
    mode: SdkMode,
}

impl BundledPreload {
    #[must_use]
    pub fn new(path: Option<PathBuf>, mode: SdkMode) -> Self {
        Self { path, mode }
    }

    #[must_use]
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(config.preload_path.clone(), config.mode)
    }
}

#[async_trait]
impl PreloadSource for BundledPreload {
    async fn is_available(&self) -> bool {
        if self.mode != SdkMode::Release {
            return false;
        }
        match &self.path {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    async fn statements(&self) -> Result<Vec<Statement>, SyncError> {
        let Some(path) = &self.path else {
            return Err(SyncError::Preload("no snapshot path configured".to_string()));
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|error| SyncError::Preload(format!("{}: {error}", path.display())))?;
        let statements: Vec<Statement> = serde_json::from_str(&content)
            .map_err(|error| SyncError::Preload(format!("{}: {error}", path.display())))?;

        tracing::debug!(path = %path.display(), statements = statements.len(), "Read preload snapshot");
        Ok(statements)
    }
}
