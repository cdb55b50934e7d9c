//! Char-indexed text storage.
//!
//! Every position in the protocol counts characters, not bytes, so all
//! splicing goes through char→byte translation.

use serde::{Deserialize, Serialize};

/// A text buffer addressed by char offsets in `[0, len]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buffer {
    text: String,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    /// Number of chars in the buffer.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte offset of the char position, saturating at the end.
    fn byte_index(&self, position: usize) -> usize {
        self.text
            .char_indices()
            .nth(position)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Splice `text` in at a char position.
    pub fn insert(&mut self, position: usize, text: &str) {
        let at = self.byte_index(position);
        self.text.insert_str(at, text);
    }

    /// Remove the half-open char range `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) {
        let from = self.byte_index(start);
        let to = self.byte_index(end);
        self.text.replace_range(from..to, "");
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_char_position() {
        let mut buf = Buffer::from_str("héllo");
        buf.insert(2, "X");
        assert_eq!(buf.as_str(), "héXllo");
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_insert_at_end() {
        let mut buf = Buffer::from_str("ab");
        buf.insert(2, "c");
        assert_eq!(buf.as_str(), "abc");
    }

    #[test]
    fn test_remove_range() {
        let mut buf = Buffer::from_str("héllo");
        buf.remove(1, 3);
        assert_eq!(buf.as_str(), "hlo");
    }

    #[test]
    fn test_remove_empty_range() {
        let mut buf = Buffer::from_str("abc");
        buf.remove(1, 1);
        assert_eq!(buf.as_str(), "abc");
    }

    #[test]
    fn test_insert_into_empty() {
        let mut buf = Buffer::new();
        buf.insert(0, "a\nb");
        assert_eq!(buf.as_str(), "a\nb");
        assert_eq!(buf.len(), 3);
    }
}
