//! 生存中の SDK インスタンスの管理
//!
//! ホストが生成時に登録し、破棄時に登録解除します。

use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use super::Sdk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

#[derive(Debug, Default)]
pub struct InstanceRegistry {
    next_id: AtomicU64,
    instances: Mutex<Vec<(InstanceId, Arc<Sdk>)>>,
}

impl InstanceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sdk: Arc<Sdk>) -> InstanceId {
        let id = InstanceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, sdk));
        tracing::debug!(?id, "Registered SDK instance");
        id
    }

    /// Removes and releases the instance. `false` when `id` is unknown.
    pub fn deregister(&self, id: InstanceId) -> bool {
        let removed = {
            let mut instances = self.lock();
            instances
                .iter()
                .position(|(existing, _)| *existing == id)
                .map(|index| instances.remove(index))
        };
        match removed {
            Some((_, sdk)) => {
                sdk.release();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<Arc<Sdk>> {
        self.lock().iter().find(|(existing, _)| *existing == id).map(|(_, sdk)| sdk.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Releases and forgets every instance, e.g. on host shutdown.
    pub fn release_all(&self) {
        let drained: Vec<_> = self.lock().drain(..).collect();
        tracing::info!(count = drained.len(), "Releasing all SDK instances");
        for (_, sdk) in drained {
            sdk.release();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(InstanceId, Arc<Sdk>)>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
