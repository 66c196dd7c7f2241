//! Invisible key identity markers.
//!
//! Identity is written as a binary number using two zero-width characters appended after the
//! visible text. The rendering layer decodes the markers out of on-screen text to find the key.

mod table;

use table::TextTable;

/// Binary digit `0`: ZERO WIDTH SPACE
pub const MARKER_ZERO: char = '\u{200B}';
/// Binary digit `1`: ZERO WIDTH NON-JOINER
pub const MARKER_ONE: char = '\u{200C}';

/// Encodes `id` as a marker sequence, most significant bit first.
#[must_use]
pub fn encode_id(id: u64) -> String {
    format!("{id:b}")
        .chars()
        .map(|digit| if digit == '1' { MARKER_ONE } else { MARKER_ZERO })
        .collect()
}

/// Decodes the marker sequence in `encoded`, ignoring every other character.
///
/// Returns `None` when there are no markers or the number does not fit in `u64`.
#[must_use]
pub fn decode_id(encoded: &str) -> Option<u64> {
    let binary: String = encoded
        .chars()
        .filter_map(|c| match c {
            MARKER_ZERO => Some('0'),
            MARKER_ONE => Some('1'),
            _ => None,
        })
        .collect();

    if binary.is_empty() {
        return None;
    }

    match u64::from_str_radix(&binary, 2) {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::debug!(%error, digits = binary.len(), "Discarding undecodable marker sequence");
            None
        }
    }
}

/// Removes all markers, leaving only the user-visible text.
#[must_use]
pub fn strip_markers(text: &str) -> String {
    text.chars().filter(|c| !is_marker(*c)).collect()
}

#[must_use]
pub const fn is_marker(c: char) -> bool {
    matches!(c, MARKER_ZERO | MARKER_ONE)
}

/// Text ↔ number codec shared by every component of one SDK instance.
///
/// The table is never evicted while the instance lives; [`IdentityCodec::clear`] resets it
/// when the instance is released.
#[derive(Debug, Default)]
pub struct IdentityCodec {
    table: TextTable,
}

impl IdentityCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `text` a number (first sight wins) and encodes it.
    #[must_use]
    pub fn encode_text(&self, text: &str) -> String {
        encode_id(self.table.number_for(text))
    }

    /// Reverse of [`IdentityCodec::encode_text`]. `None` if no markers or an unknown number.
    #[must_use]
    pub fn decode_text(&self, encoded: &str) -> Option<String> {
        decode_id(encoded).and_then(|number| self.table.text_for(number))
    }

    /// `visible` followed by the markers for `key_name`.
    #[must_use]
    pub fn tag(&self, visible: &str, key_name: &str) -> String {
        let mut tagged = String::from(visible);
        tagged.push_str(&self.encode_text(key_name));
        tagged
    }

    /// Key name hidden in rendered text, if any.
    #[must_use]
    pub fn extract_key_name(&self, rendered: &str) -> Option<String> {
        self.decode_text(rendered)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.table.clear();
    }
}
