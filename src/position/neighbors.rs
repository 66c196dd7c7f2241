//! 画面上の近くにあるキーを探す
//!
//! 矩形の中心間のユークリッド距離で近い順に並べます。

use crate::types::KeyPositionMeta;

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborQuery {
    /// Candidates farther than this are dropped.
    pub proximity_threshold: f64,
    pub max_neighbors: usize,
    /// Only consider candidates on the target's screen.
    pub same_screen_only: bool,
    /// Screen the target must be on. Any screen when `None`.
    pub screen_id: Option<String>,
}

impl Default for NeighborQuery {
    fn default() -> Self {
        Self {
            proximity_threshold: f64::INFINITY,
            max_neighbors: 5,
            same_screen_only: true,
            screen_id: None,
        }
    }
}

impl NeighborQuery {
    #[must_use]
    pub fn on_screen(screen_id: impl Into<String>) -> Self {
        Self { screen_id: Some(screen_id.into()), ..Self::default() }
    }

    #[must_use]
    pub const fn with_threshold(mut self, proximity_threshold: f64) -> Self {
        self.proximity_threshold = proximity_threshold;
        self
    }

    #[must_use]
    pub const fn with_max(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors;
        self
    }

    #[must_use]
    pub const fn across_screens(mut self) -> Self {
        self.same_screen_only = false;
        self
    }
}

#[allow(clippy::float_arithmetic)]
fn distance(a: &KeyPositionMeta, b: &KeyPositionMeta) -> f64 {
    let (ax, ay) = a.rect.center();
    let (bx, by) = b.rect.center();
    (ax - bx).hypot(ay - by)
}

/// Names of the keys closest to `key_name`, nearest first.
///
/// Ties keep the order in which the candidates were registered. Empty when the target has no
/// known position.
#[must_use]
pub fn find_neighbors(
    entries: &[KeyPositionMeta],
    key_name: &str,
    query: &NeighborQuery,
) -> Vec<String> {
    let Some(target) = entries.iter().find(|entry| {
        entry.key_name.as_deref() == Some(key_name)
            && query.screen_id.as_ref().is_none_or(|screen| &entry.screen_id == screen)
    }) else {
        tracing::debug!(key = %key_name, "No position known for key");
        return Vec::new();
    };

    let mut candidates: Vec<(f64, &str)> = entries
        .iter()
        .filter(|entry| !query.same_screen_only || entry.screen_id == target.screen_id)
        .filter_map(|entry| {
            let name = entry.key_name.as_deref()?;
            (name != key_name).then(|| (distance(target, entry), name))
        })
        .filter(|(distance, _)| *distance <= query.proximity_threshold)
        .collect();

    // 安定ソート: 同距離は登録順のまま
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut names: Vec<String> = Vec::with_capacity(query.max_neighbors.min(candidates.len()));
    for (_, name) in candidates {
        if names.len() >= query.max_neighbors {
            break;
        }
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}
