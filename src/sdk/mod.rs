//! SDK のエントリーポイント
//!
//! 各コンポーネントを所有し、ホストアプリ向けの操作をまとめて公開します。

mod builder;
mod instances;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

pub use builder::SdkBuilder;
use futures::Stream;
pub use instances::{
    InstanceId,
    InstanceRegistry,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::codec::IdentityCodec;
use crate::config::SdkConfig;
use crate::error::SyncError;
use crate::language::LanguageStore;
use crate::position::{
    NeighborQuery,
    PositionRegistry,
    ScanScheduler,
};
use crate::sync::{
    BootstrapOutcome,
    ReadyState,
    SyncCoordinator,
};
use crate::translation::{
    KeySubscription,
    TranslationStore,
};
use crate::types::{
    Key,
    KeyRef,
    Language,
    Rect,
};

/// Screen id used when the host has not installed a provider.
pub const DEFAULT_SCREEN_ID: &str = "default_screen";

/// Returns the id of the screen currently shown, if the host knows it.
pub type ScreenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// One emission of [`Sdk::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationState {
    /// Text in the selected language, followed by its key markers.
    Available(String),
    /// The bootstrap failed. Consumers keep showing the last available text.
    Error(String),
}

impl TranslationState {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Available(text) => Some(text),
            Self::Error(_) => None,
        }
    }
}

/// Waits for the ready gate, reporting its errors, then follows the key.
#[derive(Debug)]
struct Observation {
    ready: watch::Receiver<ReadyState>,
    subscription: KeySubscription,
    codec: Arc<IdentityCodec>,
    initialized: bool,
    wait_for_change: bool,
}

impl Observation {
    async fn next(&mut self) -> Option<TranslationState> {
        while !self.initialized {
            if self.wait_for_change {
                self.ready.changed().await.ok()?;
            }
            self.wait_for_change = true;

            let state = self.ready.borrow_and_update().clone();
            match state {
                ReadyState::Initialized => self.initialized = true,
                ReadyState::Error(error) => return Some(TranslationState::Error(error.to_string())),
                ReadyState::NotInitialized => {}
            }
        }

        let view = self.subscription.next().await?;
        let tagged = self.codec.tag(&view.text, self.subscription.key_name());
        Some(TranslationState::Available(tagged))
    }
}

/// One SDK instance.
///
/// Every returned text carries invisible markers naming its key, so the rendering layer can
/// report what it drew via [`Sdk::report_rendered`].
pub struct Sdk {
    config: SdkConfig,
    codec: Arc<IdentityCodec>,
    /// `false` when the marker table came from [`SdkBuilder::codec`].
    owns_codec: bool,
    languages: Arc<LanguageStore>,
    translations: Arc<TranslationStore>,
    coordinator: Arc<SyncCoordinator>,
    positions: Arc<PositionRegistry>,
    scans: ScanScheduler,
    editing: watch::Sender<bool>,
    screen_provider: RwLock<Option<ScreenProvider>>,
    released: AtomicBool,
}

impl fmt::Debug for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdk")
            .field("base_url", &self.config.base_url)
            .field("mode", &self.config.mode)
            .field("state", &self.coordinator.state())
            .field("released", &self.released.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Sdk {
    #[must_use]
    pub fn builder(config: SdkConfig) -> SdkBuilder {
        SdkBuilder::new(config)
    }

    #[must_use]
    pub const fn config(&self) -> &SdkConfig {
        &self.config
    }

    fn ensure_active(&self) -> Result<(), SyncError> {
        if self.released.load(Ordering::Acquire) {
            return Err(SyncError::Shutdown);
        }
        Ok(())
    }

    // --- 同期 ---

    /// Fills the cache, from the bundled snapshot or the backend, and opens the ready gate.
    ///
    /// # Errors
    /// See [`SyncCoordinator::bootstrap`].
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, SyncError> {
        self.ensure_active()?;
        self.coordinator.bootstrap().await
    }

    /// # Errors
    /// The bootstrap failed, or the instance was released.
    pub async fn wait_until_ready(&self) -> Result<(), SyncError> {
        self.ensure_active()?;
        self.coordinator.wait_until_ready().await
    }

    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.coordinator.state()
    }

    #[must_use]
    pub fn observe_ready(&self) -> watch::Receiver<ReadyState> {
        self.coordinator.subscribe()
    }

    // --- 翻訳 ---

    /// Text of `key_name` in the selected language, followed by its key markers.
    ///
    /// Waits for the cache to be ready.
    ///
    /// # Errors
    /// The bootstrap failed, or the instance was released.
    pub async fn translate(&self, key_name: &str) -> Result<String, SyncError> {
        self.wait_until_ready().await?;
        let text = self.translations.text(key_name);
        Ok(self.codec.tag(&text, key_name))
    }

    /// Tagged text of `key_name` once the cache is ready, then whenever it or the selected
    /// language changes.
    ///
    /// Nothing is emitted before the bootstrap ends. A failed bootstrap is emitted as
    /// [`TranslationState::Error`], and a later successful one resumes the texts.
    pub fn observe(&self, key_name: &str) -> impl Stream<Item = TranslationState> + Send + use<> {
        let observation = Observation {
            ready: self.coordinator.subscribe(),
            subscription: self.translations.observe_key(key_name),
            codec: self.codec.clone(),
            initialized: false,
            wait_for_change: false,
        };
        futures::stream::unfold(observation, |mut observation| async move {
            observation.next().await.map(|state| (state, observation))
        })
    }

    /// # Errors
    /// The bootstrap failed, or the instance was released.
    pub async fn translations(&self) -> Result<Vec<Key>, SyncError> {
        self.wait_until_ready().await?;
        self.translations.get_translations().await
    }

    /// Re-fetches every key from the backend. On failure the cache keeps its contents.
    ///
    /// # Errors
    /// Network or storage failure.
    pub async fn refresh(&self) -> Result<Vec<Key>, SyncError> {
        self.ensure_active()?;
        self.translations.refresh().await
    }

    /// Saves texts of an existing key without context.
    ///
    /// # Errors
    /// Network or storage failure.
    pub async fn update_translation(
        &self,
        key_name: &str,
        texts: BTreeMap<String, String>,
    ) -> Result<Key, SyncError> {
        self.ensure_active()?;
        self.translations.update_no_context(key_name, texts).await
    }

    /// Creates or updates `key_name`, sending the keys drawn nearest to it on the current
    /// screen as context.
    ///
    /// # Errors
    /// Network or storage failure.
    pub async fn update_translation_with_context(
        &self,
        key_name: &str,
        texts: BTreeMap<String, String>,
    ) -> Result<Key, SyncError> {
        self.ensure_active()?;
        let query = NeighborQuery::on_screen(self.current_screen_id());
        let related = self.positions.neighbors(key_name, &query);
        tracing::debug!(key = %key_name, related = related.len(), "Saving translation with context");
        self.translations.save_with_context(key_name, texts, related).await
    }

    #[must_use]
    pub fn translation_store(&self) -> &TranslationStore {
        &self.translations
    }

    // --- 言語 ---

    /// # Errors
    /// Network or storage failure while the language cache is empty.
    pub async fn languages(&self) -> Result<Vec<Language>, SyncError> {
        self.languages.languages().await
    }

    #[must_use]
    pub fn current_language(&self) -> String {
        self.languages.current_language()
    }

    /// # Errors
    /// The selection could not be persisted.
    pub async fn set_language(&self, tag: &str) -> Result<(), SyncError> {
        self.ensure_active()?;
        self.languages.set_selected_language(tag).await
    }

    #[must_use]
    pub fn observe_language(&self) -> watch::Receiver<Option<String>> {
        self.languages.observe_selected()
    }

    // --- 画面上の位置 ---

    #[must_use]
    pub const fn codec(&self) -> &Arc<IdentityCodec> {
        &self.codec
    }

    #[must_use]
    pub const fn positions(&self) -> &Arc<PositionRegistry> {
        &self.positions
    }

    pub fn set_screen_provider<F>(&self, provider: F)
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        *self.screen_provider.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(provider));
    }

    #[must_use]
    pub fn current_screen_id(&self) -> String {
        self.screen_provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|provider| provider())
            .filter(|screen| !screen.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCREEN_ID.to_string())
    }

    /// Registers the key hidden in `rendered` at `rect` on the current screen.
    ///
    /// Returns `false` when the text carries no known markers or the position is rejected.
    pub fn report_rendered(&self, rendered: &str, rect: Rect) -> bool {
        let Some(key_name) = self.codec.extract_key_name(rendered) else {
            return false;
        };
        self.positions.register(KeyRef::Name(key_name), rect, &self.current_screen_id())
    }

    pub fn clear_screen(&self, screen_id: &str) {
        self.positions.clear_screen(screen_id);
    }

    // --- 編集モードとスキャン ---

    pub fn set_editing(&self, editing: bool) {
        self.editing.send_if_modified(|current| {
            let changed = *current != editing;
            *current = editing;
            changed
        });
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        *self.editing.borrow()
    }

    #[must_use]
    pub fn observe_editing(&self) -> watch::Receiver<bool> {
        self.editing.subscribe()
    }

    /// `true` when enough time has passed since the previous scan.
    #[must_use]
    pub fn request_scan(&self) -> bool {
        self.scans.try_acquire()
    }

    /// Runs `scan` periodically while editing is on.
    pub fn spawn_rescan<F>(&self, scan: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.scans.spawn_periodic(self.editing.subscribe(), scan)
    }

    // --- 破棄 ---

    /// Drops ephemeral state. Later sync calls fail with [`SyncError::Shutdown`].
    ///
    /// A marker table shared through [`SdkBuilder::codec`] is left to its other users.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_editing(false);
        self.positions.clear_all();
        if self.owns_codec {
            self.codec.clear();
        }
        tracing::info!("Released SDK instance");
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
