//! Core types used throughout the project.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

pub type KeyId = i64;
pub type LanguageId = i64;
pub type TranslationId = i64;

/// Language tag selected when nothing else applies.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A project language as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: LanguageId,
    pub name: String,
    pub original_name: String,
    /// Locale code, unique within a project (e.g. `en`, `cs-CZ`).
    pub tag: String,
    pub flag_glyph: String,
    pub is_base: bool,
}

/// The text of one key in one language.
///
/// `(key_id, language_id)` is unique. `id` is the server surrogate and stays stable across
/// text updates; `0` means not yet persisted. `language_id == 0` means the language has not
/// been resolved from the tag yet (rows fresh from the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: TranslationId,
    pub key_id: KeyId,
    pub language_id: LanguageId,
    pub text: Option<String>,
}

impl Translation {
    /// Text if present and non-empty.
    #[must_use]
    pub fn visible_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// A translation key with its translations indexed by language tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: KeyId,
    pub name: String,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
}

impl Key {
    #[must_use]
    pub fn new(id: KeyId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), translations: BTreeMap::new() }
    }

    /// Text surfaced to the caller for `language_tag`.
    ///
    /// Falls back to the key name when the translation is missing or empty, so the caller
    /// never receives an empty string.
    #[must_use]
    pub fn text_for(&self, language_tag: &str) -> &str {
        self.translations
            .get(language_tag)
            .and_then(Translation::visible_text)
            .unwrap_or(&self.name)
    }
}

/// An on-screen rectangle in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Finite origin, finite and strictly positive extent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    #[must_use]
    #[allow(clippy::float_arithmetic)]
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Identifies a key reported by the UI layer, either by server id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyRef {
    Id(KeyId),
    Name(String),
}

impl KeyRef {
    /// Ids must be positive, names must not be blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Id(id) => *id <= 0,
            Self::Name(name) => name.trim().is_empty(),
        }
    }
}

impl From<&str> for KeyRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeyRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<KeyId> for KeyRef {
    fn from(id: KeyId) -> Self {
        Self::Id(id)
    }
}

/// Last known on-screen position of a key. Lives in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPositionMeta {
    pub key_id: Option<KeyId>,
    pub key_name: Option<String>,
    pub rect: Rect,
    pub namespace: Option<String>,
    pub screen_id: String,
}

impl KeyPositionMeta {
    #[must_use]
    pub fn matches(&self, key: &KeyRef) -> bool {
        match key {
            KeyRef::Id(id) => self.key_id == Some(*id),
            KeyRef::Name(name) => self.key_name.as_deref() == Some(name.as_str()),
        }
    }
}
