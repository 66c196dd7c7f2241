//! 言語一覧と、ユーザーが選択中の言語を管理するモジュール

mod selection;

use std::sync::Arc;

pub use selection::choose_language;
use tokio::sync::{
    Mutex,
    watch,
};

use crate::error::SyncError;
use crate::preferences::Preferences;
use crate::remote::RemoteGateway;
use crate::storage::{
    Statement,
    Storage,
};
use crate::types::{
    DEFAULT_LANGUAGE,
    Language,
};

/// Known languages and the selected UI language.
///
/// The selection is published through a `watch` channel so observers re-render when it
/// changes.
#[derive(Debug)]
pub struct LanguageStore {
    storage: Arc<dyn Storage>,
    remote: RemoteGateway,
    preferences: Arc<dyn Preferences>,
    selected: watch::Sender<Option<String>>,
    write_lock: Arc<Mutex<()>>,
}

impl LanguageStore {
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        remote: RemoteGateway,
        preferences: Arc<dyn Preferences>,
    ) -> Self {
        let (selected, _) = watch::channel(None);
        Self { storage, remote, preferences, selected, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Lock held by every writer of cached rows.
    pub(crate) fn write_lock(&self) -> Arc<Mutex<()>> {
        self.write_lock.clone()
    }

    /// Languages from the cache, fetched from the backend when the cache is empty.
    ///
    /// # Errors
    /// Network or storage failure while filling an empty cache.
    pub async fn languages(&self) -> Result<Vec<Language>, SyncError> {
        let cached = self.storage.all_languages();
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.refresh().await
    }

    #[must_use]
    pub fn cached_languages(&self) -> Vec<Language> {
        self.storage.all_languages()
    }

    /// Fetches languages from the backend and replaces the cached set with them.
    ///
    /// Translations stay attached to their language tag even when the backend changed the
    /// language id. Translations of languages that disappeared are dropped.
    ///
    /// # Errors
    /// Network or storage failure. The cache is left unchanged.
    pub async fn refresh(&self) -> Result<Vec<Language>, SyncError> {
        let languages = self.remote.fetch_languages().await?;
        {
            let _guard = self.write_lock.lock().await;
            self.storage.transaction(vec![Statement::ReplaceLanguages(languages.clone())])?;
        }

        tracing::debug!(count = languages.len(), "Stored languages");
        Ok(languages)
    }

    /// Decides the initial selection and persists it.
    ///
    /// On failure `"en"` is persisted and selected, and the failure is still reported.
    ///
    /// # Errors
    /// `SyncError::Language` when the preferences could not be read or written.
    pub async fn initialize_selection(&self, languages: &[Language]) -> Result<String, SyncError> {
        match self.select(languages).await {
            Ok(tag) => {
                tracing::info!(language = %tag, "Selected language");
                self.selected.send_replace(Some(tag.clone()));
                Ok(tag)
            }
            Err(error) => {
                tracing::warn!(%error, "Language selection failed, falling back to {DEFAULT_LANGUAGE}");
                if let Err(fallback_error) =
                    self.preferences.set_selected_language(DEFAULT_LANGUAGE).await
                {
                    tracing::error!(error = %fallback_error, "Failed to persist fallback language");
                }
                self.selected.send_replace(Some(DEFAULT_LANGUAGE.to_string()));
                Err(SyncError::Language(error.to_string()))
            }
        }
    }

    async fn select(&self, languages: &[Language]) -> Result<String, SyncError> {
        let persisted = self.preferences.selected_language().await?;
        let system = self.preferences.system_language();
        let tag = choose_language(persisted.as_deref(), system.as_deref(), languages);

        if persisted.as_deref() != Some(tag.as_str()) {
            self.preferences.set_selected_language(&tag).await?;
        }
        Ok(tag)
    }

    /// Changes the UI language. Observers are notified only when the tag actually changes.
    ///
    /// # Errors
    /// The preference could not be persisted; the previous selection stays active.
    pub async fn set_selected_language(&self, tag: &str) -> Result<(), SyncError> {
        self.preferences.set_selected_language(tag).await?;
        self.selected.send_if_modified(|current| {
            if current.as_deref() == Some(tag) {
                false
            } else {
                *current = Some(tag.to_string());
                true
            }
        });
        tracing::debug!(language = %tag, "Changed selected language");
        Ok(())
    }

    /// Selected tag, `"en"` until a selection has been made.
    #[must_use]
    pub fn current_language(&self) -> String {
        self.selected.borrow().clone().unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    #[must_use]
    pub fn observe_selected(&self) -> watch::Receiver<Option<String>> {
        self.selected.subscribe()
    }
}
