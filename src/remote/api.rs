//! Raw backend endpoints.

use async_trait::async_trait;

use super::RemoteError;
use super::dto::{
    KeyWithContextRequest,
    KeyWithContextResponse,
    KeysPageResponse,
    LanguagesResponse,
    UpdateTranslationRequest,
    UpdateTranslationResponse,
};

/// One method per backend endpoint, no pagination or mapping.
#[async_trait]
pub trait BackendApi: Send + Sync + std::fmt::Debug {
    /// `GET v2/projects/languages`
    async fn languages(&self) -> Result<LanguagesResponse, RemoteError>;

    /// `GET v2/projects/translations?page&languages`
    ///
    /// `languages` is a comma-separated list of tags.
    async fn translations_page(
        &self,
        page: u32,
        languages: &str,
    ) -> Result<KeysPageResponse, RemoteError>;

    /// `PUT v2/projects/translations`
    async fn update_translation(
        &self,
        request: &UpdateTranslationRequest,
    ) -> Result<UpdateTranslationResponse, RemoteError>;

    /// `POST v2/projects/keys/create`
    async fn create_key(
        &self,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError>;

    /// `PUT v2/projects/keys/{id}/complex-update`
    async fn update_key(
        &self,
        key_id: i64,
        request: &KeyWithContextRequest,
    ) -> Result<KeyWithContextResponse, RemoteError>;
}
