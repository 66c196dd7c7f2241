//! 永続化されるユーザー設定
//!
//! 選択中の言語と「プリロード済み」フラグの 2 つだけを保持します。

use std::fmt::Debug;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    PoisonError,
};

use async_trait::async_trait;
use locale_config::Locale;
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::SyncError;

/// Durable key-value pairs owned by the host.
#[async_trait]
pub trait Preferences: Send + Sync + Debug {
    async fn selected_language(&self) -> Result<Option<String>, SyncError>;

    async fn set_selected_language(&self, tag: &str) -> Result<(), SyncError>;

    async fn was_preloaded(&self) -> Result<bool, SyncError>;

    async fn set_was_preloaded(&self, preloaded: bool) -> Result<(), SyncError>;

    /// Primary language subtag of the device locale (`cs` for `cs-CZ`).
    fn system_language(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredPreferences {
    selected_language: Option<String>,
    was_preloaded: bool,
}

/// システムロケールの primary subtag を返す
#[must_use]
pub fn detect_system_language() -> Option<String> {
    let locale = Locale::user_default();
    locale.tags().find_map(|(_category, tag)| primary_subtag(tag.as_ref()))
}

/// `cs_CZ.UTF-8` や `LC_ALL=de-AT` のような値から言語部分だけを取り出す
fn primary_subtag(raw: &str) -> Option<String> {
    let value = raw.trim().rsplit('=').next().unwrap_or(raw);
    let language: String = value
        .split(['-', '_', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if language.is_empty() || language == "c" || language == "posix" {
        return None;
    }
    Some(language)
}

/// Preferences kept for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    state: Mutex<StoredPreferences>,
    system_language: Option<String>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_system_language(mut self, tag: impl Into<String>) -> Self {
        self.system_language = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_selected_language(self, tag: impl Into<String>) -> Self {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).selected_language =
            Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_preloaded(self, preloaded: bool) -> Self {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).was_preloaded = preloaded;
        self
    }
}

#[async_trait]
impl Preferences for MemoryPreferences {
    async fn selected_language(&self) -> Result<Option<String>, SyncError> {
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner).selected_language.clone())
    }

    async fn set_selected_language(&self, tag: &str) -> Result<(), SyncError> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).selected_language =
            Some(tag.to_string());
        Ok(())
    }

    async fn was_preloaded(&self) -> Result<bool, SyncError> {
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner).was_preloaded)
    }

    async fn set_was_preloaded(&self, preloaded: bool) -> Result<(), SyncError> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).was_preloaded = preloaded;
        Ok(())
    }

    fn system_language(&self) -> Option<String> {
        self.system_language.clone()
    }
}

/// JSON ファイルに保存する Preferences
///
/// 書き込みは一時ファイルに書いてから rename するので、途中で落ちても壊れたファイルは残りません。
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
    system_language: Option<String>,
}

impl FilePreferences {
    /// システムロケールを検出して作成する
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
            system_language: detect_system_language(),
        }
    }

    /// ロケール検出を上書きする（`None` で検出結果なし扱い）
    #[must_use]
    pub fn with_system_language(mut self, tag: Option<String>) -> Self {
        self.system_language = tag;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoredPreferences, SyncError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|error| {
                SyncError::Preferences(format!("{}: {error}", self.path.display()))
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Ok(StoredPreferences::default())
            }
            Err(error) => Err(SyncError::Preferences(format!("{}: {error}", self.path.display()))),
        }
    }

    async fn store(&self, preferences: &StoredPreferences) -> Result<(), SyncError> {
        let io_error =
            |error: std::io::Error| SyncError::Preferences(format!("{}: {error}", self.path.display()));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let content = serde_json::to_string_pretty(preferences)
            .map_err(|error| SyncError::Preferences(error.to_string()))?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await.map_err(io_error)?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(io_error)?;

        tracing::debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }

    async fn modify(&self, change: impl FnOnce(&mut StoredPreferences) + Send) -> Result<(), SyncError> {
        let _guard = self.lock.lock().await;
        let mut preferences = self.load().await?;
        change(&mut preferences);
        self.store(&preferences).await
    }
}

#[async_trait]
impl Preferences for FilePreferences {
    async fn selected_language(&self) -> Result<Option<String>, SyncError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.selected_language)
    }

    async fn set_selected_language(&self, tag: &str) -> Result<(), SyncError> {
        let tag = tag.to_string();
        self.modify(move |preferences| preferences.selected_language = Some(tag)).await
    }

    async fn was_preloaded(&self) -> Result<bool, SyncError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.was_preloaded)
    }

    async fn set_was_preloaded(&self, preloaded: bool) -> Result<(), SyncError> {
        self.modify(move |preferences| preferences.was_preloaded = preloaded).await
    }

    fn system_language(&self) -> Option<String> {
        self.system_language.clone()
    }
}
