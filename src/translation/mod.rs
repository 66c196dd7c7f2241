//! 翻訳キャッシュ
//!
//! ネットワークから取得したキーをストレージにマージし、利用側へ提供します。
//! マージは `(key_id, language_id)` で既存行を探し、見つかればその行の id を保ったまま
//! テキストだけを更新します。

mod subscription;

use std::collections::{
    BTreeMap,
    HashMap,
    HashSet,
};
use std::sync::Arc;

pub use subscription::{
    KeySubscription,
    KeyView,
};

use crate::error::SyncError;
use crate::language::LanguageStore;
use crate::remote::RemoteGateway;
use crate::storage::{
    Statement,
    Storage,
};
use crate::types::{
    Key,
    KeyId,
    Language,
    LanguageId,
    Translation,
};

/// Row counts of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub keys: usize,
    pub translations: usize,
    /// Translations whose language tag is unknown.
    pub skipped: usize,
}

/// Local cache of keys and translations, and the single writer of their rows.
#[derive(Debug)]
pub struct TranslationStore {
    storage: Arc<dyn Storage>,
    remote: RemoteGateway,
    languages: Arc<LanguageStore>,
    /// Shared with the language store so every row write is serialized.
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl TranslationStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, remote: RemoteGateway, languages: Arc<LanguageStore>) -> Self {
        let write_lock = languages.write_lock();
        Self { storage, remote, languages, write_lock }
    }

    /// Upserts `keys` and `languages` in one transaction.
    ///
    /// Translations are matched to stored rows by `(key_id, language_id)`. A match keeps its
    /// row id and only takes the new text; otherwise a row is inserted with the incoming id,
    /// or a fresh one when the id is `0` or already used by another pair.
    ///
    /// # Errors
    /// `SyncError::Storage` when the transaction is rejected; nothing is written.
    pub async fn merge(&self, keys: Vec<Key>, languages: &[Language]) -> Result<MergeSummary, SyncError> {
        let _guard = self.write_lock.lock().await;

        let language_ids: HashMap<&str, LanguageId> =
            languages.iter().map(|l| (l.tag.as_str(), l.id)).collect();
        let mut statements: Vec<Statement> =
            languages.iter().cloned().map(Statement::UpsertLanguage).collect();
        // 同じバッチ内で同じ組が再登場した場合は既存の文を書き換える
        let mut staged: HashMap<(KeyId, LanguageId), usize> = HashMap::new();
        let mut used_ids: HashSet<i64> = HashSet::new();
        let mut summary = MergeSummary::default();

        for key in keys {
            statements.push(Statement::UpsertKey { id: key.id, name: key.name.clone() });
            summary.keys += 1;

            for (tag, translation) in key.translations {
                let Some(language_id) = language_ids
                    .get(tag.as_str())
                    .copied()
                    .or_else(|| (translation.language_id != 0).then_some(translation.language_id))
                else {
                    tracing::warn!(key = %key.name, language = %tag, "Skipping translation for unknown language");
                    summary.skipped += 1;
                    continue;
                };

                let pair = (key.id, language_id);
                if let Some(Statement::PutTranslation(row)) =
                    staged.get(&pair).and_then(|index| statements.get_mut(*index))
                {
                    row.text = translation.text;
                    continue;
                }

                let id = match self.storage.find_translation(key.id, language_id) {
                    Some(existing) => existing.id,
                    None if self.id_taken(translation.id, pair, &used_ids) => {
                        tracing::warn!(
                            key = %key.name,
                            language = %tag,
                            id = translation.id,
                            "Translation id already used by another pair, assigning a new one"
                        );
                        0
                    }
                    None => translation.id,
                };
                if id != 0 {
                    used_ids.insert(id);
                }
                staged.insert(pair, statements.len());
                statements.push(Statement::PutTranslation(Translation {
                    id,
                    key_id: key.id,
                    language_id,
                    text: translation.text,
                }));
                summary.translations += 1;
            }
        }

        self.storage.transaction(statements)?;
        tracing::info!(
            keys = summary.keys,
            translations = summary.translations,
            skipped = summary.skipped,
            "Merged translations"
        );
        Ok(summary)
    }

    fn id_taken(&self, id: i64, pair: (KeyId, LanguageId), used_ids: &HashSet<i64>) -> bool {
        id != 0
            && (used_ids.contains(&id)
                || self
                    .storage
                    .find_translation_by_id(id)
                    .is_some_and(|row| (row.key_id, row.language_id) != pair))
    }

    /// Clears keys, translations and languages, then applies `statements`, all in one
    /// transaction.
    ///
    /// # Errors
    /// `SyncError::Storage` when any statement is rejected; the previous cache survives.
    pub async fn replace_all(&self, statements: Vec<Statement>) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;

        let count = statements.len();
        let mut batch =
            vec![Statement::DeleteTranslations, Statement::DeleteKeys, Statement::DeleteLanguages];
        batch.extend(statements);
        self.storage.transaction(batch)?;

        tracing::info!(statements = count, "Replaced cache contents");
        Ok(())
    }

    /// Cached keys, or fetched from the backend when the cache holds none.
    ///
    /// # Errors
    /// Network or storage failure while filling an empty cache.
    pub async fn get_translations(&self) -> Result<Vec<Key>, SyncError> {
        if self.storage.key_count() > 0 {
            return Ok(self.storage.all_keys());
        }
        self.refresh().await
    }

    /// Fetches every key for the known languages and merges them.
    ///
    /// # Errors
    /// Network or storage failure. Cached data is untouched in that case.
    pub async fn refresh(&self) -> Result<Vec<Key>, SyncError> {
        let languages = self.languages.languages().await?;
        self.fetch_and_merge(&languages).await?;
        Ok(self.storage.all_keys())
    }

    /// # Errors
    /// Network or storage failure. Cached data is untouched in that case.
    pub async fn fetch_and_merge(&self, languages: &[Language]) -> Result<MergeSummary, SyncError> {
        let tags: Vec<String> = languages.iter().map(|l| l.tag.clone()).collect();
        let keys = self.remote.fetch_translations(&tags).await?;
        self.merge(keys, languages).await
    }

    /// # Errors
    /// `SyncError::NotFound` when no key has this id.
    pub fn key_by_id(&self, id: KeyId) -> Result<Key, SyncError> {
        self.storage.find_key_by_id(id).ok_or_else(|| SyncError::NotFound(format!("key with id {id}")))
    }

    #[must_use]
    pub fn key_by_name(&self, name: &str) -> Option<Key> {
        self.storage.find_key_by_name(name)
    }

    /// Stored key, or an unsaved key with one empty translation per known language.
    #[must_use]
    pub fn key_by_name_or_empty(&self, name: &str) -> Key {
        if let Some(key) = self.storage.find_key_by_name(name) {
            return key;
        }

        let mut key = Key::new(0, name);
        for language in self.storage.all_languages() {
            key.translations.insert(
                language.tag,
                Translation { id: 0, key_id: 0, language_id: language.id, text: None },
            );
        }
        key
    }

    /// Names of the keys with the given ids, in the same order. Unknown ids are skipped.
    #[must_use]
    pub fn key_names_by_ids(&self, ids: &[KeyId]) -> Vec<String> {
        ids.iter().filter_map(|id| self.storage.find_key_by_id(*id)).map(|key| key.name).collect()
    }

    /// Visible text of `name` in the selected language.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        let language = self.languages.current_language();
        self.storage
            .find_key_by_name(name)
            .map_or_else(|| name.to_string(), |key| key.text_for(&language).to_string())
    }

    #[must_use]
    pub fn observe_key(&self, name: &str) -> KeySubscription {
        KeySubscription::new(self.storage.clone(), name.to_string(), self.languages.observe_selected())
    }

    /// Saves texts of an existing key without related-key context.
    ///
    /// # Errors
    /// Network or storage failure.
    pub async fn update_no_context(
        &self,
        name: &str,
        texts: BTreeMap<String, String>,
    ) -> Result<Key, SyncError> {
        let key = self.remote.update_translation(name, texts).await?;
        self.store_saved(key).await
    }

    /// Creates the key when it is unknown, otherwise updates it, sending `related` as the
    /// ordered context.
    ///
    /// # Errors
    /// Network or storage failure.
    pub async fn save_with_context(
        &self,
        name: &str,
        texts: BTreeMap<String, String>,
        related: Vec<String>,
    ) -> Result<Key, SyncError> {
        let key = match self.storage.find_key_by_name(name) {
            Some(existing) => {
                self.remote.update_key_with_context(existing.id, name, texts, related).await?
            }
            None => self.remote.create_key_with_context(name, texts, related).await?,
        };
        self.store_saved(key).await
    }

    async fn store_saved(&self, key: Key) -> Result<Key, SyncError> {
        let id = key.id;
        let languages = self.storage.all_languages();
        self.merge(vec![key], &languages).await?;
        self.key_by_id(id)
    }
}
