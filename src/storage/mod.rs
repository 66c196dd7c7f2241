//! Durable storage contract for keys, translations and languages.
//!
//! Writes go through [`Storage::transaction`], which applies a batch of [`Statement`]s
//! atomically. Every committed write bumps a revision counter that subscribers can watch.

mod memory;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tokio::sync::watch;

pub use memory::MemoryStorage;

use crate::types::{
    Key,
    KeyId,
    Language,
    LanguageId,
    Translation,
    TranslationId,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A second row for an existing (key, language) pair
    #[error(
        "Translation for key {key_id} and language {language_id} already exists with id {existing_id}"
    )]
    DuplicateTranslation { key_id: KeyId, language_id: LanguageId, existing_id: i64 },

    #[error("Translation references missing {0}")]
    MissingReference(String),

    #[error("Language tag '{0}' is already used by another language")]
    DuplicateLanguageTag(String),

    /// A translation id already bound to another (key, language) pair
    #[error("Translation id {id} already belongs to key {key_id} and language {language_id}")]
    TranslationIdTaken { id: TranslationId, key_id: KeyId, language_id: LanguageId },
}

/// One write inside a transaction.
///
/// Serialized form is used by bundled preload snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Statement {
    /// Insert or replace a language by id.
    UpsertLanguage(Language),
    /// Replace the whole language table. Translations follow their language's tag to the new
    /// id; translations of tags that are gone are removed.
    ReplaceLanguages(Vec<Language>),
    /// Insert a key or overwrite its name.
    UpsertKey { id: KeyId, name: String },
    /// Insert or replace a translation row by surrogate id. `id == 0` assigns a fresh id.
    PutTranslation(Translation),
    DeleteTranslations,
    DeleteKeys,
    DeleteLanguages,
}

/// Relational store with three row kinds and a unique (key, language) constraint on
/// translations.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Applies all statements or none of them.
    ///
    /// # Errors
    /// Returns the first constraint violation; prior state is left unchanged.
    fn transaction(&self, statements: Vec<Statement>) -> Result<(), StorageError>;

    /// Languages in insertion order.
    fn all_languages(&self) -> Vec<Language>;

    /// Keys with their translations indexed by language tag.
    fn all_keys(&self) -> Vec<Key>;

    fn key_count(&self) -> usize;

    fn translation_count(&self) -> usize;

    fn find_key_by_id(&self, id: KeyId) -> Option<Key>;

    fn find_key_by_name(&self, name: &str) -> Option<Key>;

    fn find_translation(&self, key_id: KeyId, language_id: LanguageId) -> Option<Translation>;

    fn find_translation_by_id(&self, id: TranslationId) -> Option<Translation>;

    /// Revision counter, bumped after every committed transaction.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
