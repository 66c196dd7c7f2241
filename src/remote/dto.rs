//! Wire types of the translation backend.
//!
//! Collections come wrapped in a HAL `_embedded` object which the backend omits entirely when
//! the collection is empty.

use std::collections::{
    BTreeMap,
    HashMap,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::{
    Key,
    Language,
    Translation,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguagesResponse {
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedLanguages,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedLanguages {
    #[serde(default)]
    pub languages: Vec<LanguageDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    pub tag: String,
    #[serde(default)]
    pub flag_emoji: Option<String>,
    #[serde(rename = "base", default)]
    pub is_base: bool,
}

impl From<LanguageDto> for Language {
    fn from(dto: LanguageDto) -> Self {
        Self {
            id: dto.id,
            original_name: dto.original_name.unwrap_or_else(|| dto.name.clone()),
            name: dto.name,
            tag: dto.tag,
            flag_glyph: dto.flag_emoji.unwrap_or_default(),
            is_base: dto.is_base,
        }
    }
}

/// One page of `GET v2/projects/translations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysPageResponse {
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedKeys,
    #[serde(default)]
    pub page: Option<PageMetadata>,
}

impl KeysPageResponse {
    /// Page count declared by the response. Read from `page` when present, otherwise from
    /// `_embedded`; a response that declares nothing is a single page.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.page
            .as_ref()
            .map(|page| page.total_pages)
            .or(self.embedded.total_pages)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedKeys {
    #[serde(default)]
    pub keys: Vec<KeyDto>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDto {
    pub key_id: i64,
    pub key_name: String,
    #[serde(default)]
    pub translations: HashMap<String, TranslationDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationDto {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
}

/// Builds a domain key whose translations are not yet bound to language ids.
fn unresolved_key(key_id: i64, key_name: String, translations: HashMap<String, TranslationDto>) -> Key {
    let translations: BTreeMap<String, Translation> = translations
        .into_iter()
        .map(|(tag, dto)| {
            (tag, Translation { id: dto.id, key_id, language_id: 0, text: dto.text })
        })
        .collect();
    Key { id: key_id, name: key_name, translations }
}

impl From<KeyDto> for Key {
    fn from(dto: KeyDto) -> Self {
        unresolved_key(dto.key_id, dto.key_name, dto.translations)
    }
}

/// `PUT v2/projects/translations`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTranslationRequest {
    pub key: String,
    pub translations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTranslationResponse {
    pub key_id: i64,
    pub key_name: String,
    #[serde(default)]
    pub translations: HashMap<String, TranslationDto>,
}

impl From<UpdateTranslationResponse> for Key {
    fn from(response: UpdateTranslationResponse) -> Self {
        unresolved_key(response.key_id, response.key_name, response.translations)
    }
}

/// Body of `POST v2/projects/keys/create` and `PUT v2/projects/keys/{id}/complex-update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWithContextRequest {
    pub name: String,
    pub related_keys_in_order: Vec<RelatedKey>,
    pub translations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedKey {
    pub key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyWithContextResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub translations: HashMap<String, TranslationDto>,
}

impl From<KeyWithContextResponse> for Key {
    fn from(response: KeyWithContextResponse) -> Self {
        unresolved_key(response.id, response.name, response.translations)
    }
}
