//! Reactive view of a single key.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;

use crate::storage::Storage;
use crate::types::{
    DEFAULT_LANGUAGE,
    Key,
};

/// What a consumer of one key sees at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyView {
    /// `None` while the key is unknown to the cache.
    pub key: Option<Key>,
    pub language: String,
    /// Never empty: falls back to the key name.
    pub text: String,
}

/// Emits the current [`KeyView`] immediately, then again whenever the stored key or the selected
/// language changes the view.
#[derive(Debug)]
pub struct KeySubscription {
    storage: Arc<dyn Storage>,
    key_name: String,
    revisions: watch::Receiver<u64>,
    language: watch::Receiver<Option<String>>,
    last: Option<KeyView>,
}

impl KeySubscription {
    pub(super) fn new(
        storage: Arc<dyn Storage>,
        key_name: String,
        language: watch::Receiver<Option<String>>,
    ) -> Self {
        let revisions = storage.subscribe();
        Self { storage, key_name, revisions, language, last: None }
    }

    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    fn current(&mut self) -> KeyView {
        // 読んだ時点までの変更は既読にする
        self.revisions.mark_unchanged();
        let language =
            self.language.borrow_and_update().clone().unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let key = self.storage.find_key_by_name(&self.key_name);
        let text = key.as_ref().map_or_else(
            || self.key_name.clone(),
            |key| key.text_for(&language).to_string(),
        );
        KeyView { key, language, text }
    }

    /// Next distinct view. `None` once the language source is gone.
    pub async fn next(&mut self) -> Option<KeyView> {
        if self.last.is_none() {
            let view = self.current();
            self.last = Some(view.clone());
            return Some(view);
        }

        loop {
            tokio::select! {
                changed = self.revisions.changed() => changed.ok()?,
                changed = self.language.changed() => changed.ok()?,
            }

            let view = self.current();
            if self.last.as_ref() != Some(&view) {
                tracing::trace!(key = %self.key_name, language = %view.language, "Key view changed");
                self.last = Some(view.clone());
                return Some(view);
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = KeyView> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription.next().await.map(|view| (view, subscription))
        })
    }
}
