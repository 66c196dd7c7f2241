//! Remote translation backend.
//!
//! [`BackendApi`] is the raw endpoint surface, [`HttpBackend`] its HTTP implementation, and
//! [`RemoteGateway`] adds pagination, deduplication and mapping into domain types on top.

mod api;
pub mod dto;
mod http;

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::sync::Arc;

pub use api::BackendApi;
use dto::{
    KeyDto,
    KeyWithContextRequest,
    RelatedKey,
    UpdateTranslationRequest,
};
pub use http::HttpBackend;
use thiserror::Error;

use crate::types::{
    Key,
    KeyId,
    Language,
};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend not reachable for a reason other than transport (used by in-process backends)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Keys accumulated across pages. A key seen again replaces the earlier copy in place.
#[derive(Debug, Default)]
struct KeyCollector {
    keys: Vec<Key>,
    positions: HashMap<KeyId, usize>,
}

impl KeyCollector {
    fn extend(&mut self, page: Vec<KeyDto>) {
        for dto in page {
            let key = Key::from(dto);
            match self.positions.get(&key.id).and_then(|index| self.keys.get_mut(*index)) {
                Some(slot) => *slot = key,
                None => {
                    self.positions.insert(key.id, self.keys.len());
                    self.keys.push(key);
                }
            }
        }
    }

    fn into_keys(self) -> Vec<Key> {
        self.keys
    }
}

/// Upper bound on pages fetched in one pass, whatever the backend declares.
const MAX_PAGES: u32 = 10_000;

fn related_keys(names: Vec<String>) -> Vec<RelatedKey> {
    names.into_iter().map(|key_name| RelatedKey { key_name, namespace: None }).collect()
}

/// Domain-level access to the backend.
///
/// Returned keys carry translations indexed by tag with `language_id == 0`; binding them to
/// stored languages is the translation store's job.
#[derive(Debug, Clone)]
pub struct RemoteGateway {
    api: Arc<dyn BackendApi>,
}

impl RemoteGateway {
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self { api }
    }

    /// All project languages, base language first. Remaining order follows the backend.
    ///
    /// # Errors
    /// Transport or backend failure.
    pub async fn fetch_languages(&self) -> Result<Vec<Language>, RemoteError> {
        let response = self.api.languages().await?;
        let mut languages: Vec<Language> =
            response.embedded.languages.into_iter().map(Language::from).collect();

        // 安定ソートなので base 以外の順序は維持される
        languages.sort_by_key(|language| !language.is_base);

        tracing::debug!(count = languages.len(), "Fetched languages");
        Ok(languages)
    }

    /// Every key with translations for `language_tags`.
    ///
    /// Pages are requested one after another; the result is returned only once the last page
    /// has arrived, so callers never merge a partial set.
    ///
    /// # Errors
    /// The first failing page aborts the whole fetch.
    pub async fn fetch_translations(&self, language_tags: &[String]) -> Result<Vec<Key>, RemoteError> {
        let languages = language_tags.join(",");

        let first = self.api.translations_page(0, &languages).await?;
        let declared_pages = first.total_pages().max(1);
        let total_pages = declared_pages.min(MAX_PAGES);
        if declared_pages > MAX_PAGES {
            tracing::warn!(declared_pages, limit = MAX_PAGES, "Backend declared too many pages, capping");
        }
        tracing::debug!(page = 0, total_pages, keys = first.embedded.keys.len(), "Fetched translation page");

        let mut collector = KeyCollector::default();
        collector.extend(first.embedded.keys);

        for page in 1..total_pages {
            let response = self.api.translations_page(page, &languages).await?;
            tracing::debug!(page, total_pages, keys = response.embedded.keys.len(), "Fetched translation page");
            if response.embedded.keys.is_empty() {
                tracing::debug!(page, "Empty page, stopping");
                break;
            }
            collector.extend(response.embedded.keys);
        }

        let keys = collector.into_keys();
        tracing::info!(keys = keys.len(), pages = total_pages, "Fetched translations");
        Ok(keys)
    }

    /// Sets texts of an existing key without context.
    ///
    /// # Errors
    /// Transport or backend failure.
    pub async fn update_translation(
        &self,
        key_name: &str,
        texts: BTreeMap<String, String>,
    ) -> Result<Key, RemoteError> {
        let request = UpdateTranslationRequest { key: key_name.to_string(), translations: texts };
        Ok(self.api.update_translation(&request).await?.into())
    }

    /// Creates a key together with its texts and related keys.
    ///
    /// # Errors
    /// Transport or backend failure.
    pub async fn create_key_with_context(
        &self,
        key_name: &str,
        texts: BTreeMap<String, String>,
        related: Vec<String>,
    ) -> Result<Key, RemoteError> {
        let request = KeyWithContextRequest {
            name: key_name.to_string(),
            related_keys_in_order: related_keys(related),
            translations: texts,
        };
        Ok(self.api.create_key(&request).await?.into())
    }

    /// Updates texts and related keys of the key with server id `key_id`.
    ///
    /// # Errors
    /// Transport or backend failure.
    pub async fn update_key_with_context(
        &self,
        key_id: KeyId,
        key_name: &str,
        texts: BTreeMap<String, String>,
        related: Vec<String>,
    ) -> Result<Key, RemoteError> {
        let request = KeyWithContextRequest {
            name: key_name.to_string(),
            related_keys_in_order: related_keys(related),
            translations: texts,
        };
        Ok(self.api.update_key(key_id, &request).await?.into())
    }
}
