//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数と、インメモリのバックエンドを提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::sync::Mutex;
use std::sync::atomic::{
    AtomicBool,
    AtomicI64,
    AtomicUsize,
    Ordering,
};
use std::time::Duration;

use async_trait::async_trait;

use crate::remote::dto::{
    EmbeddedKeys,
    EmbeddedLanguages,
    KeyDto,
    KeyWithContextRequest,
    KeyWithContextResponse,
    KeysPageResponse,
    LanguageDto,
    LanguagesResponse,
    PageMetadata,
    TranslationDto,
    UpdateTranslationRequest,
    UpdateTranslationResponse,
};
use crate::remote::{
    BackendApi,
    RemoteError,
};
use crate::types::{
    Key,
    Language,
    Translation,
};

/// テスト用の Language を作成する
pub(crate) fn language(id: i64, tag: &str, is_base: bool) -> Language {
    Language {
        id,
        name: tag.to_uppercase(),
        original_name: tag.to_uppercase(),
        tag: tag.to_string(),
        flag_glyph: String::new(),
        is_base,
    }
}

pub(crate) fn language_dto(id: i64, tag: &str, is_base: bool) -> LanguageDto {
    LanguageDto {
        id,
        name: tag.to_uppercase(),
        original_name: None,
        tag: tag.to_string(),
        flag_emoji: None,
        is_base,
    }
}

/// `translations` は `(tag, translation id, text)` の組
pub(crate) fn key_dto(id: i64, name: &str, translations: &[(&str, i64, &str)]) -> KeyDto {
    KeyDto {
        key_id: id,
        key_name: name.to_string(),
        translations: translations
            .iter()
            .map(|(tag, tid, text)| {
                ((*tag).to_string(), TranslationDto { id: *tid, text: Some((*text).to_string()) })
            })
            .collect(),
    }
}

/// ネットワークから届いたばかりの Key（language_id 未解決）を作成する
pub(crate) fn wire_key(id: i64, name: &str, translations: &[(&str, i64, &str)]) -> Key {
    let mut key = Key::new(id, name);
    for (tag, tid, text) in translations {
        key.translations.insert(
            (*tag).to_string(),
            Translation { id: *tid, key_id: id, language_id: 0, text: Some((*text).to_string()) },
        );
    }
    key
}

/// ページングと更新系エンドポイントを再現するインメモリのバックエンド
#[derive(Debug)]
pub(crate) struct FakeBackend {
    page_size: usize,
    languages: Vec<LanguageDto>,
    keys: Mutex<Vec<KeyDto>>,
    fail_from_page: Option<u32>,
    offline: AtomicBool,
    next_id: AtomicI64,
    pages: Mutex<Vec<u32>>,
    language_params: Mutex<Vec<String>>,
    context_requests: Mutex<Vec<KeyWithContextRequest>>,
    language_calls: AtomicUsize,
    latency: Option<Duration>,
    declared_pages: Option<u32>,
}

impl FakeBackend {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            languages: Vec::new(),
            keys: Mutex::new(Vec::new()),
            fail_from_page: None,
            offline: AtomicBool::new(false),
            next_id: AtomicI64::new(1000),
            pages: Mutex::new(Vec::new()),
            language_params: Mutex::new(Vec::new()),
            context_requests: Mutex::new(Vec::new()),
            language_calls: AtomicUsize::new(0),
            latency: None,
            declared_pages: None,
        }
    }

    pub(crate) fn with_languages(mut self, languages: Vec<LanguageDto>) -> Self {
        self.languages = languages;
        self
    }

    pub(crate) fn with_keys(self, keys: Vec<KeyDto>) -> Self {
        *self.keys.lock().unwrap() = keys;
        self
    }

    /// 言語一覧の応答を遅らせる（同時実行のテスト用）
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// ページ数の申告を実際の件数と無関係な値にする
    pub(crate) fn with_declared_pages(mut self, pages: u32) -> Self {
        self.declared_pages = Some(pages);
        self
    }

    pub(crate) fn failing_from_page(mut self, page: u32) -> Self {
        self.fail_from_page = Some(page);
        self
    }

    /// すべてのリクエストを失敗させる
    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn set_key_text(&self, key_id: i64, tag: &str, text: &str) {
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|k| k.key_id == key_id)
            && let Some(translation) = key.translations.get_mut(tag)
        {
            translation.text = Some(text.to_string());
        }
    }

    pub(crate) fn requested_pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }

    pub(crate) fn requested_languages(&self) -> Vec<String> {
        self.language_params.lock().unwrap().clone()
    }

    pub(crate) fn context_requests(&self) -> Vec<KeyWithContextRequest> {
        self.context_requests.lock().unwrap().clone()
    }

    pub(crate) fn language_calls(&self) -> usize {
        self.language_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        Ok(())
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn apply_texts(&self, key: &mut KeyDto, texts: &BTreeMap<String, String>) {
        for (tag, text) in texts {
            let id = key.translations.get(tag).map_or_else(|| self.fresh_id(), |t| t.id);
            key.translations.insert(tag.clone(), TranslationDto { id, text: Some(text.clone()) });
        }
    }

    fn context_response(key: &KeyDto) -> KeyWithContextResponse {
        KeyWithContextResponse {
            id: key.key_id,
            name: key.key_name.clone(),
            description: None,
            translations: key.translations.clone(),
        }
    }

    fn not_found(what: &str) -> RemoteError {
        RemoteError::Status { status: 404, body: format!("{what} not found") }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn languages(&self) -> Result<LanguagesResponse, RemoteError> {
        self.language_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_online()?;
        Ok(LanguagesResponse {
            embedded: EmbeddedLanguages { languages: self.languages.clone() },
        })
    }

    async fn translations_page(
        &self,
        page: u32,
        languages: &str,
    ) -> Result<KeysPageResponse, RemoteError> {
        self.pages.lock().unwrap().push(page);
        self.language_params.lock().unwrap().push(languages.to_string());
        self.check_online()?;
        if self.fail_from_page.is_some_and(|from| page >= from) {
            return Err(RemoteError::Unavailable(format!("page {page} failed")));
        }

        let keys = self.keys.lock().unwrap();
        let total_pages = keys.len().div_ceil(self.page_size).max(1);
        let chunk: Vec<KeyDto> = keys
            .chunks(self.page_size)
            .nth(page as usize)
            .map(<[KeyDto]>::to_vec)
            .unwrap_or_default();

        Ok(KeysPageResponse {
            embedded: EmbeddedKeys { keys: chunk, total_pages: None, current_page: None },
            page: Some(PageMetadata {
                total_pages: self
                    .declared_pages
                    .unwrap_or_else(|| u32::try_from(total_pages).unwrap()),
                number: page,
            }),
        })
    }

    async fn update_translation(
        &self,
        request: &UpdateTranslationRequest,
    ) -> Result<UpdateTranslationResponse, RemoteError> {
        self.check_online()?;
        let mut keys = self.keys.lock().unwrap();
        let key = keys
            .iter_mut()
            .find(|k| k.key_name == request.key)
            .ok_or_else(|| Self::not_found(&request.key))?;
        self.apply_texts(key, &request.translations);

        Ok(UpdateTranslationResponse {
            key_id: key.key_id,
            key_name: key.key_name.clone(),
            translations: key.translations.clone(),
        })
    }

    async fn create_key(
        &self,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError> {
        self.check_online()?;
        self.context_requests.lock().unwrap().push(request.clone());

        let mut key = KeyDto {
            key_id: self.fresh_id(),
            key_name: request.name.clone(),
            translations: HashMap::new(),
        };
        self.apply_texts(&mut key, &request.translations);
        let response = Self::context_response(&key);
        self.keys.lock().unwrap().push(key);
        Ok(response)
    }

    async fn update_key(
        &self,
        key_id: i64,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError> {
        self.check_online()?;
        self.context_requests.lock().unwrap().push(request.clone());

        let mut keys = self.keys.lock().unwrap();
        let key = keys
            .iter_mut()
            .find(|k| k.key_id == key_id)
            .ok_or_else(|| Self::not_found(&format!("key {key_id}")))?;
        key.key_name.clone_from(&request.name);
        self.apply_texts(key, &request.translations);
        Ok(Self::context_response(key))
    }
}
