//! Process-lifetime text ↔ number table.

use std::collections::HashMap;
use std::sync::{
    PoisonError,
    RwLock,
};

#[derive(Debug)]
struct Entries {
    by_text: HashMap<String, u64>,
    by_number: HashMap<u64, String>,
    next: u64,
}

impl Default for Entries {
    fn default() -> Self {
        Self { by_text: HashMap::new(), by_number: HashMap::new(), next: 1 }
    }
}

/// Bijective table. Numbers start at 1 and are never reused until [`TextTable::clear`].
#[derive(Debug, Default)]
pub(super) struct TextTable {
    entries: RwLock<Entries>,
}

impl TextTable {
    /// Existing number for `text`, or a freshly assigned one.
    ///
    /// Lookup and assignment happen under the write lock, so concurrent callers racing on the
    /// same unseen text all receive the same number.
    pub(super) fn number_for(&self, text: &str) -> u64 {
        if let Some(number) =
            self.entries.read().unwrap_or_else(PoisonError::into_inner).by_text.get(text)
        {
            return *number;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(number) = entries.by_text.get(text) {
            return *number;
        }

        let number = entries.next;
        entries.next = entries.next.saturating_add(1);
        entries.by_text.insert(text.to_string(), number);
        entries.by_number.insert(number, text.to_string());
        number
    }

    pub(super) fn text_for(&self, number: u64) -> Option<String> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).by_number.get(&number).cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).by_text.len()
    }

    pub(super) fn clear(&self) {
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Entries::default();
    }
}
