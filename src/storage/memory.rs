//! In-process implementation of [`Storage`].

use std::collections::{
    BTreeMap,
    HashMap,
    HashSet,
};
use std::sync::{
    PoisonError,
    RwLock,
};

use tokio::sync::watch;

use super::{
    Statement,
    Storage,
    StorageError,
};
use crate::types::{
    Key,
    KeyId,
    Language,
    LanguageId,
    Translation,
    TranslationId,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    languages: Vec<Language>,
    keys: BTreeMap<KeyId, String>,
    translations: BTreeMap<TranslationId, Translation>,
    /// (key, language) → translation id, ordered so one key's rows form a range
    pairs: BTreeMap<(KeyId, LanguageId), TranslationId>,
}

impl Tables {
    fn apply(&mut self, statement: Statement) -> Result<(), StorageError> {
        match statement {
            Statement::UpsertLanguage(language) => self.upsert_language(language),
            Statement::ReplaceLanguages(languages) => self.replace_languages(languages),
            Statement::UpsertKey { id, name } => {
                self.keys.insert(id, name);
                Ok(())
            }
            Statement::PutTranslation(row) => self.put_translation(row),
            Statement::DeleteTranslations => {
                self.translations.clear();
                self.pairs.clear();
                Ok(())
            }
            Statement::DeleteKeys => {
                self.keys.clear();
                self.translations.clear();
                self.pairs.clear();
                Ok(())
            }
            Statement::DeleteLanguages => {
                self.languages.clear();
                self.translations.clear();
                self.pairs.clear();
                Ok(())
            }
        }
    }

    fn upsert_language(&mut self, language: Language) -> Result<(), StorageError> {
        if self.languages.iter().any(|l| l.tag == language.tag && l.id != language.id) {
            return Err(StorageError::DuplicateLanguageTag(language.tag));
        }

        if let Some(existing) = self.languages.iter_mut().find(|l| l.id == language.id) {
            *existing = language;
        } else {
            self.languages.push(language);
        }
        Ok(())
    }

    fn replace_languages(&mut self, languages: Vec<Language>) -> Result<(), StorageError> {
        let mut tags = HashSet::new();
        if let Some(duplicate) = languages.iter().find(|l| !tags.insert(l.tag.as_str())) {
            return Err(StorageError::DuplicateLanguageTag(duplicate.tag.clone()));
        }

        let new_ids: HashMap<&str, LanguageId> =
            languages.iter().map(|l| (l.tag.as_str(), l.id)).collect();
        let remap: HashMap<LanguageId, LanguageId> = self
            .languages
            .iter()
            .filter_map(|old| new_ids.get(old.tag.as_str()).map(|new_id| (old.id, *new_id)))
            .collect();

        // タグが一意なので対応は単射、(key, language) の衝突は起きない
        self.translations.retain(|_, row| match remap.get(&row.language_id) {
            Some(new_id) => {
                row.language_id = *new_id;
                true
            }
            None => false,
        });
        self.pairs =
            self.translations.values().map(|row| ((row.key_id, row.language_id), row.id)).collect();
        self.languages = languages;
        Ok(())
    }

    fn put_translation(&mut self, mut row: Translation) -> Result<(), StorageError> {
        if !self.keys.contains_key(&row.key_id) {
            return Err(StorageError::MissingReference(format!("key {}", row.key_id)));
        }
        if !self.languages.iter().any(|l| l.id == row.language_id) {
            return Err(StorageError::MissingReference(format!("language {}", row.language_id)));
        }

        if row.id == 0 {
            row.id = self.translations.keys().next_back().map_or(1, |last| last.saturating_add(1));
        }

        let pair = (row.key_id, row.language_id);
        if let Some(existing_id) = self.pairs.get(&pair)
            && *existing_id != row.id
        {
            return Err(StorageError::DuplicateTranslation {
                key_id: row.key_id,
                language_id: row.language_id,
                existing_id: *existing_id,
            });
        }

        if let Some(previous) = self.translations.get(&row.id)
            && (previous.key_id, previous.language_id) != pair
        {
            return Err(StorageError::TranslationIdTaken {
                id: row.id,
                key_id: previous.key_id,
                language_id: previous.language_id,
            });
        }
        self.pairs.insert(pair, row.id);
        self.translations.insert(row.id, row);
        Ok(())
    }

    fn assemble_key(&self, id: KeyId, name: &str) -> Key {
        let tags: HashMap<LanguageId, &str> =
            self.languages.iter().map(|l| (l.id, l.tag.as_str())).collect();

        let mut key = Key::new(id, name);
        let rows = self
            .pairs
            .range((id, LanguageId::MIN)..=(id, LanguageId::MAX))
            .filter_map(|(_, row_id)| self.translations.get(row_id));
        for translation in rows {
            if let Some(tag) = tags.get(&translation.language_id) {
                key.translations.insert((*tag).to_string(), translation.clone());
            }
        }
        key
    }
}

/// Relational tables behind a lock. Transactions stage changes on a copy and swap it in only
/// when every statement succeeds.
#[derive(Debug)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    revision: watch::Sender<u64>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self { tables: RwLock::new(Tables::default()), revision }
    }
}

impl Storage for MemoryStorage {
    fn transaction(&self, statements: Vec<Statement>) -> Result<(), StorageError> {
        let count = statements.len();
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            let mut staged = tables.clone();
            for statement in statements {
                staged.apply(statement)?;
            }
            *tables = staged;
        }

        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
        tracing::trace!(statements = count, "Committed storage transaction");
        Ok(())
    }

    fn all_languages(&self) -> Vec<Language> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).languages.clone()
    }

    fn all_keys(&self) -> Vec<Key> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.keys.iter().map(|(id, name)| tables.assemble_key(*id, name)).collect()
    }

    fn key_count(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).keys.len()
    }

    fn translation_count(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).translations.len()
    }

    fn find_key_by_id(&self, id: KeyId) -> Option<Key> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.keys.get(&id).map(|name| tables.assemble_key(id, name))
    }

    fn find_key_by_name(&self, name: &str) -> Option<Key> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .keys
            .iter()
            .find(|(_, key_name)| key_name.as_str() == name)
            .map(|(id, key_name)| tables.assemble_key(*id, key_name))
    }

    fn find_translation(&self, key_id: KeyId, language_id: LanguageId) -> Option<Translation> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.pairs.get(&(key_id, language_id)).and_then(|id| tables.translations.get(id)).cloned()
    }

    fn find_translation_by_id(&self, id: TranslationId) -> Option<Translation> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).translations.get(&id).cloned()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
