//! One-shot readiness broadcast.

use tokio::sync::watch;

use crate::error::SyncError;

#[derive(Debug, Clone, Default)]
pub enum ReadyState {
    #[default]
    NotInitialized,
    Initialized,
    Error(SyncError),
}

impl ReadyState {
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized)
    }
}

/// `Initialized` is terminal: once set, every current and future waiter passes immediately.
#[derive(Debug)]
pub struct ReadyGate {
    state: watch::Sender<ReadyState>,
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyGate {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ReadyState::NotInitialized);
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> ReadyState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_initialized()
    }

    pub fn set_initialized(&self) {
        self.state.send_if_modified(|state| {
            if state.is_initialized() {
                return false;
            }
            *state = ReadyState::Initialized;
            true
        });
    }

    /// Ignored once initialized.
    pub fn set_error(&self, error: SyncError) {
        self.state.send_if_modified(|state| {
            if state.is_initialized() {
                return false;
            }
            *state = ReadyState::Error(error);
            true
        });
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReadyState> {
        self.state.subscribe()
    }

    /// Suspends until the state leaves `NotInitialized`.
    ///
    /// # Errors
    /// The error the last bootstrap attempt ended with.
    pub async fn wait(&self) -> Result<(), SyncError> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| !matches!(state, ReadyState::NotInitialized))
            .await
            .map_err(|_| SyncError::Shutdown)?;

        match &*state {
            ReadyState::Error(error) => Err(error.clone()),
            ReadyState::NotInitialized | ReadyState::Initialized => Ok(()),
        }
    }
}
