//! `reqwest` implementation of [`BackendApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{
    Client,
    RequestBuilder,
};
use serde::de::DeserializeOwned;
use url::Url;

use super::RemoteError;
use super::api::BackendApi;
use super::dto::{
    KeyWithContextRequest,
    KeyWithContextResponse,
    KeysPageResponse,
    LanguagesResponse,
    UpdateTranslationRequest,
    UpdateTranslationResponse,
};
use crate::config::SdkConfig;

const API_KEY_HEADER: &str = "X-API-Key";

/// Talks JSON over HTTPS to the translation backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_key: String,
    page_size: u32,
}

impl HttpBackend {
    /// # Errors
    /// - `base_url` が URL として不正
    /// - HTTP クライアントの初期化に失敗
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        // join() は末尾の `/` がないと最後のセグメントを置き換えてしまう
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url, api_key: api_key.into(), page_size })
    }

    /// # Errors
    /// See [`HttpBackend::new`].
    pub fn from_config(config: &SdkConfig) -> Result<Self, RemoteError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            config.page_size,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Backend rejected request");
            return Err(RemoteError::Status { status: status.as_u16(), body });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn languages(&self) -> Result<LanguagesResponse, RemoteError> {
        let url = self.endpoint("v2/projects/languages")?;
        self.send(self.client.get(url)).await
    }

    async fn translations_page(
        &self,
        page: u32,
        languages: &str,
    ) -> Result<KeysPageResponse, RemoteError> {
        let mut url = self.endpoint("v2/projects/translations")?;
        url.query_pairs_mut()
            .append_pair("size", &self.page_size.to_string())
            .append_pair("sort", "keyId,asc")
            .append_pair("page", &page.to_string())
            .append_pair("languages", languages);
        self.send(self.client.get(url)).await
    }

    async fn update_translation(
        &self,
        request: &UpdateTranslationRequest,
    ) -> Result<UpdateTranslationResponse, RemoteError> {
        let url = self.endpoint("v2/projects/translations")?;
        self.send(self.client.put(url).json(request)).await
    }

    async fn create_key(
        &self,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError> {
        let url = self.endpoint("v2/projects/keys/create")?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn update_key(
        &self,
        key_id: i64,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError> {
        let url = self.endpoint(&format!("v2/projects/keys/{key_id}/complex-update"))?;
        self.send(self.client.put(url).json(request)).await
    }
}
