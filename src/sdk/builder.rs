//! [`Sdk`] の組み立て

use std::sync::atomic::AtomicBool;
use std::sync::{
    Arc,
    RwLock,
};
use std::time::Duration;

use tokio::sync::watch;

use super::Sdk;
use crate::codec::IdentityCodec;
use crate::config::{
    ConfigError,
    SdkConfig,
    ValidationError,
};
use crate::language::LanguageStore;
use crate::position::{
    PositionRegistry,
    ScanScheduler,
};
use crate::preferences::{
    FilePreferences,
    MemoryPreferences,
    Preferences,
    detect_system_language,
};
use crate::preload::{
    BundledPreload,
    PreloadSource,
};
use crate::remote::{
    BackendApi,
    HttpBackend,
    RemoteGateway,
};
use crate::storage::{
    MemoryStorage,
    Storage,
};
use crate::sync::SyncCoordinator;
use crate::translation::TranslationStore;

const DEFAULT_MIN_SCAN_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Collaborators left unset are derived from the config.
#[derive(Debug)]
pub struct SdkBuilder {
    config: SdkConfig,
    backend: Option<Arc<dyn BackendApi>>,
    storage: Option<Arc<dyn Storage>>,
    preferences: Option<Arc<dyn Preferences>>,
    preload: Option<Arc<dyn PreloadSource>>,
    codec: Option<Arc<IdentityCodec>>,
    min_scan_interval: Duration,
    rescan_interval: Duration,
}

impl SdkBuilder {
    #[must_use]
    pub const fn new(config: SdkConfig) -> Self {
        Self {
            config,
            backend: None,
            storage: None,
            preferences: None,
            preload: None,
            codec: None,
            min_scan_interval: DEFAULT_MIN_SCAN_INTERVAL,
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
        }
    }

    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn BackendApi>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    #[must_use]
    pub fn preload(mut self, preload: Arc<dyn PreloadSource>) -> Self {
        self.preload = Some(preload);
        self
    }

    /// Shares one marker table between instances of the same process.
    #[must_use]
    pub fn codec(mut self, codec: Arc<IdentityCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    #[must_use]
    pub const fn scan_intervals(mut self, min_interval: Duration, rescan_interval: Duration) -> Self {
        self.min_scan_interval = min_interval;
        self.rescan_interval = rescan_interval;
        self
    }

    /// # Errors
    /// The config is invalid, or the HTTP client cannot be created.
    pub fn build(self) -> Result<Sdk, ConfigError> {
        self.config.validate().map_err(ConfigError::ValidationErrors)?;

        let backend: Arc<dyn BackendApi> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpBackend::from_config(&self.config).map_err(|e| {
                ConfigError::ValidationErrors(vec![ValidationError::new("baseUrl", e.to_string())])
            })?),
        };
        let storage = self.storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let preferences = self.preferences.unwrap_or_else(|| default_preferences(&self.config));
        let preload = self
            .preload
            .unwrap_or_else(|| Arc::new(BundledPreload::from_config(&self.config)));

        let remote = RemoteGateway::new(backend);
        let languages =
            Arc::new(LanguageStore::new(storage.clone(), remote.clone(), preferences.clone()));
        let translations =
            Arc::new(TranslationStore::new(storage, remote, languages.clone()));
        let coordinator = Arc::new(SyncCoordinator::new(
            preferences,
            preload,
            languages.clone(),
            translations.clone(),
        ));
        let (editing, _) = watch::channel(false);
        let owns_codec = self.codec.is_none();

        tracing::info!(base_url = %self.config.base_url, mode = ?self.config.mode, "SDK created");

        Ok(Sdk {
            config: self.config,
            codec: self.codec.unwrap_or_default(),
            owns_codec,
            languages,
            translations,
            coordinator,
            positions: Arc::new(PositionRegistry::new()),
            scans: ScanScheduler::new(self.min_scan_interval, self.rescan_interval),
            editing,
            screen_provider: RwLock::new(None),
            released: AtomicBool::new(false),
        })
    }
}

fn default_preferences(config: &SdkConfig) -> Arc<dyn Preferences> {
    match &config.preferences_path {
        Some(path) => Arc::new(FilePreferences::new(path)),
        None => {
            let preferences = MemoryPreferences::new();
            match detect_system_language() {
                Some(tag) => Arc::new(preferences.with_system_language(tag)),
                None => Arc::new(preferences),
            }
        }
    }
}
