//! 同期処理全体で使うエラー型
//!
//! キャッシュ・同期の操作はすべて `Result<T, SyncError>` を返します。
//! `SyncError` は ready ゲートで全待機者にブロードキャストされるため `Clone` です。

use std::sync::Arc;

use thiserror::Error;

use crate::remote::RemoteError;
use crate::storage::StorageError;

#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Transport or backend failure
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Arc<RemoteError>>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to initialize language: {0}")]
    Language(String),

    #[error("Failed to load preloaded translations: {0}")]
    Preload(String),

    #[error("Failed to access preferences: {0}")]
    Preferences(String),

    /// The SDK instance was released
    #[error("SDK instance has been shut down")]
    Shutdown,
}

impl SyncError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), source: None }
    }
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        Self::Network { message: error.to_string(), source: Some(Arc::new(error)) }
    }
}
