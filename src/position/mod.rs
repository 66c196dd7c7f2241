//! 画面上のキー位置の登録
//!
//! UI 側のスキャンが、描画済みテキストから復号したキーと矩形をここへ報告します。
//! 変更のたびに全体のスナップショットを `watch` で配信します。

mod neighbors;
mod scan;

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use futures::Stream;
pub use neighbors::{
    NeighborQuery,
    find_neighbors,
};
pub use scan::ScanScheduler;
use tokio::sync::watch;

use crate::types::{
    KeyPositionMeta,
    KeyRef,
    Rect,
};

pub type Snapshot = Arc<Vec<KeyPositionMeta>>;

/// Last known rectangle of every key, per screen.
///
/// Writers serialize on an internal lock and publish an immutable snapshot when done, so
/// readers only ever see complete snapshots and never wait for a writer.
#[derive(Debug)]
pub struct PositionRegistry {
    entries: Mutex<Vec<KeyPositionMeta>>,
    snapshots: watch::Sender<Snapshot>,
}

impl Default for PositionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self { entries: Mutex::new(Vec::new()), snapshots }
    }

    /// Records where `key` is drawn on `screen_id`.
    ///
    /// Blank keys, blank screens and invalid rectangles are ignored and `false` is returned.
    pub fn register(&self, key: impl Into<KeyRef>, rect: Rect, screen_id: &str) -> bool {
        self.register_in_namespace(key, rect, screen_id, None)
    }

    pub fn register_in_namespace(
        &self,
        key: impl Into<KeyRef>,
        rect: Rect,
        screen_id: &str,
        namespace: Option<&str>,
    ) -> bool {
        let key = key.into();
        if key.is_blank() {
            tracing::warn!(?key, "Ignoring position for blank key");
            return false;
        }
        if screen_id.trim().is_empty() {
            tracing::warn!(?key, "Ignoring position without screen id");
            return false;
        }
        if !rect.is_valid() {
            tracing::warn!(?key, ?rect, "Ignoring invalid rectangle");
            return false;
        }

        self.mutate(|entries| {
            if let Some(entry) =
                entries.iter_mut().find(|e| e.screen_id == screen_id && e.matches(&key))
            {
                entry.rect = rect;
                if namespace.is_some() {
                    entry.namespace = namespace.map(str::to_string);
                }
                return;
            }

            let (key_id, key_name) = match key {
                KeyRef::Id(id) => (Some(id), None),
                KeyRef::Name(name) => (None, Some(name)),
            };
            entries.push(KeyPositionMeta {
                key_id,
                key_name,
                rect,
                namespace: namespace.map(str::to_string),
                screen_id: screen_id.to_string(),
            });
        });
        true
    }

    /// Removes only the entries of `screen_id`.
    pub fn clear_screen(&self, screen_id: &str) {
        self.mutate(|entries| entries.retain(|e| e.screen_id != screen_id));
        tracing::debug!(screen = %screen_id, "Cleared screen positions");
    }

    pub fn clear_all(&self) {
        self.mutate(Vec::clear);
    }

    /// 書き込みはロック内で行い、同じロック内でスナップショットを配信する
    fn mutate(&self, change: impl FnOnce(&mut Vec<KeyPositionMeta>)) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut entries);
        self.snapshots.send_replace(Arc::new(entries.clone()));
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn find(&self, key: &KeyRef, screen_id: &str) -> Option<KeyPositionMeta> {
        self.snapshot().iter().find(|e| e.screen_id == screen_id && e.matches(key)).cloned()
    }

    #[must_use]
    pub fn get_by_screen(&self, screen_id: &str) -> Vec<KeyPositionMeta> {
        self.snapshot().iter().filter(|e| e.screen_id == screen_id).cloned().collect()
    }

    /// Replays the latest snapshot to new subscribers.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Entries of `screen_id`, now and after every registry change.
    pub fn observe_by_screen(
        &self,
        screen_id: &str,
    ) -> impl Stream<Item = Vec<KeyPositionMeta>> + Send + use<> {
        let mut receiver = self.snapshots.subscribe();
        receiver.mark_changed();
        let screen_id = screen_id.to_string();

        futures::stream::unfold((receiver, screen_id), |(mut receiver, screen_id)| async move {
            receiver.changed().await.ok()?;
            let entries: Vec<KeyPositionMeta> = receiver
                .borrow_and_update()
                .iter()
                .filter(|e| e.screen_id == screen_id)
                .cloned()
                .collect();
            Some((entries, (receiver, screen_id)))
        })
    }

    /// See [`find_neighbors`].
    #[must_use]
    pub fn neighbors(&self, key_name: &str, query: &NeighborQuery) -> Vec<String> {
        find_neighbors(&self.snapshot(), key_name, query)
    }
}
