//! 結合テスト用のインメモリバックエンド

#![allow(clippy::unwrap_used, dead_code, unreachable_pub)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{
    AtomicBool,
    AtomicI64,
    Ordering,
};

use async_trait::async_trait;
use tolgee_sync::config::{
    SdkConfig,
    SdkConfigBuilder,
};
use tolgee_sync::remote::dto::{
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
use tolgee_sync::remote::{
    BackendApi,
    RemoteError,
};

pub fn config() -> SdkConfig {
    SdkConfigBuilder::new().base_url("https://app.tolgee.io").api_key("test-key").build().unwrap()
}

pub fn language(id: i64, tag: &str, is_base: bool) -> LanguageDto {
    LanguageDto {
        id,
        name: tag.to_uppercase(),
        original_name: None,
        tag: tag.to_string(),
        flag_emoji: None,
        is_base,
    }
}

pub fn key(id: i64, name: &str, translations: &[(&str, i64, &str)]) -> KeyDto {
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

/// Pages keys like the real backend and records what was asked for.
#[derive(Debug)]
pub struct Backend {
    page_size: usize,
    languages: Vec<LanguageDto>,
    keys: Mutex<Vec<KeyDto>>,
    offline: AtomicBool,
    next_id: AtomicI64,
    pages: Mutex<Vec<u32>>,
    context_requests: Mutex<Vec<KeyWithContextRequest>>,
}

impl Backend {
    pub fn new(page_size: usize, languages: Vec<LanguageDto>, keys: Vec<KeyDto>) -> Self {
        Self {
            page_size,
            languages,
            keys: Mutex::new(keys),
            offline: AtomicBool::new(false),
            next_id: AtomicI64::new(5000),
            pages: Mutex::new(Vec::new()),
            context_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_text(&self, key_id: i64, tag: &str, text: &str) {
        let mut keys = self.keys.lock().unwrap();
        let key = keys.iter_mut().find(|k| k.key_id == key_id).unwrap();
        key.translations.get_mut(tag).unwrap().text = Some(text.to_string());
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }

    pub fn context_requests(&self) -> Vec<KeyWithContextRequest> {
        self.context_requests.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        Ok(())
    }

    fn apply(&self, key: &mut KeyDto, texts: &std::collections::BTreeMap<String, String>) {
        for (tag, text) in texts {
            let id = key
                .translations
                .get(tag)
                .map_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst), |t| t.id);
            key.translations.insert(tag.clone(), TranslationDto { id, text: Some(text.clone()) });
        }
    }
}

#[async_trait]
impl BackendApi for Backend {
    async fn languages(&self) -> Result<LanguagesResponse, RemoteError> {
        self.check_online()?;
        Ok(LanguagesResponse { embedded: EmbeddedLanguages { languages: self.languages.clone() } })
    }

    async fn translations_page(
        &self,
        page: u32,
        _languages: &str,
    ) -> Result<KeysPageResponse, RemoteError> {
        self.check_online()?;
        self.pages.lock().unwrap().push(page);
        let keys = self.keys.lock().unwrap();
        let total_pages = u32::try_from(keys.len().div_ceil(self.page_size).max(1)).unwrap();
        let chunk = keys.chunks(self.page_size).nth(page as usize).map(<[KeyDto]>::to_vec);
        Ok(KeysPageResponse {
            embedded: EmbeddedKeys {
                keys: chunk.unwrap_or_default(),
                total_pages: None,
                current_page: None,
            },
            page: Some(PageMetadata { total_pages, number: page }),
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
            .ok_or_else(|| RemoteError::Status { status: 404, body: request.key.clone() })?;
        self.apply(key, &request.translations);
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
            key_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            key_name: request.name.clone(),
            translations: HashMap::new(),
        };
        self.apply(&mut key, &request.translations);
        let response = KeyWithContextResponse {
            id: key.key_id,
            name: key.key_name.clone(),
            description: None,
            translations: key.translations.clone(),
        };
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
            .ok_or_else(|| RemoteError::Status { status: 404, body: key_id.to_string() })?;
        self.apply(key, &request.translations);
        Ok(KeyWithContextResponse {
            id: key.key_id,
            name: key.key_name.clone(),
            description: None,
            translations: key.translations.clone(),
        })
    }
}
