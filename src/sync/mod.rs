//! 起動時の同期処理
//!
//! プリロード（同梱スナップショット）かネットワーク取得のどちらかでキャッシュを埋め、
//! 完了したら ready ゲートを開きます。
//!
//! 1. 過去にプリロード済みなら必ずネットワーク
//! 2. 同梱スナップショットが使えればそれを適用し、失敗したらネットワークへフォールバック
//! 3. それ以外はネットワーク

mod gate;

use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

pub use gate::{
    ReadyGate,
    ReadyState,
};
use tokio::sync::watch;

use crate::error::SyncError;
use crate::language::LanguageStore;
use crate::preferences::Preferences;
use crate::preload::PreloadSource;
use crate::translation::TranslationStore;

/// How a [`SyncCoordinator::bootstrap`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Seeded from the bundled snapshot.
    Preloaded,
    /// Filled from the backend.
    Network,
    /// An earlier call already succeeded.
    AlreadyInitialized,
    /// Another call is bootstrapping right now; wait on the gate instead.
    AlreadyRunning,
}

/// Clears the running flag however the bootstrap ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct SyncCoordinator {
    preferences: Arc<dyn Preferences>,
    preload: Arc<dyn PreloadSource>,
    languages: Arc<LanguageStore>,
    translations: Arc<TranslationStore>,
    gate: ReadyGate,
    running: AtomicBool,
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(
        preferences: Arc<dyn Preferences>,
        preload: Arc<dyn PreloadSource>,
        languages: Arc<LanguageStore>,
        translations: Arc<TranslationStore>,
    ) -> Self {
        Self {
            preferences,
            preload,
            languages,
            translations,
            gate: ReadyGate::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Runs the bootstrap unless it already succeeded or is running.
    ///
    /// After a failure the gate holds the error and nothing retries on its own; calling this
    /// again starts a fresh attempt.
    ///
    /// # Errors
    /// Failure of the network path. Preload failures fall back to the network and are not
    /// returned.
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, SyncError> {
        if self.gate.is_initialized() {
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }
        let Some(_running) = RunningGuard::acquire(&self.running) else {
            tracing::debug!("Bootstrap already in progress");
            return Ok(BootstrapOutcome::AlreadyRunning);
        };
        // フラグ取得前に別の呼び出しが完了していた場合
        if self.gate.is_initialized() {
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }

        match self.run().await {
            Ok(outcome) => {
                tracing::info!(?outcome, "Bootstrap finished");
                self.gate.set_initialized();
                Ok(outcome)
            }
            Err(error) => {
                tracing::error!(%error, "Bootstrap failed");
                self.gate.set_error(error.clone());
                Err(error)
            }
        }
    }

    async fn run(&self) -> Result<BootstrapOutcome, SyncError> {
        if self.preferences.was_preloaded().await? {
            tracing::debug!("Snapshot was applied on an earlier start, refreshing from the backend");
            self.bootstrap_from_network().await?;
            return Ok(BootstrapOutcome::Network);
        }

        if self.preload.is_available().await {
            match self.bootstrap_from_preload().await {
                Ok(()) => return Ok(BootstrapOutcome::Preloaded),
                Err(error) => {
                    tracing::warn!(%error, "Preload failed, falling back to the backend");
                }
            }
        }

        self.bootstrap_from_network().await?;
        Ok(BootstrapOutcome::Network)
    }

    async fn bootstrap_from_preload(&self) -> Result<(), SyncError> {
        let statements = self.preload.statements().await?;
        self.translations.replace_all(statements).await?;
        self.preferences.set_was_preloaded(true).await?;

        let languages = self.languages.cached_languages();
        self.languages.initialize_selection(&languages).await?;
        tracing::info!(languages = languages.len(), "Bootstrapped from bundled snapshot");
        Ok(())
    }

    async fn bootstrap_from_network(&self) -> Result<(), SyncError> {
        let languages = self.languages.refresh().await?;
        self.languages.initialize_selection(&languages).await?;
        self.translations.fetch_and_merge(&languages).await?;
        tracing::info!(languages = languages.len(), "Bootstrapped from backend");
        Ok(())
    }

    /// # Errors
    /// The error the last bootstrap attempt ended with.
    pub async fn wait_until_ready(&self) -> Result<(), SyncError> {
        self.gate.wait().await
    }

    #[must_use]
    pub fn state(&self) -> ReadyState {
        self.gate.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReadyState> {
        self.gate.subscribe()
    }
}
