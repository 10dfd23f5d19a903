//! Chunk module - the unit of retrieval

use serde::{Deserialize, Serialize};

/// A bounded slice of normalized document text
///
/// Chunks are created once by the chunker and never mutated afterwards.
/// The text is always post-normalization. `page` and `start` locate the
/// slice inside the normalized page text it was cut from, so consecutive
/// chunks of one page can be stitched back together by dropping overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the owning document
    pub doc_id: String,

    /// Position of this chunk within its document, unique per document
    pub ordinal: usize,

    /// Normalized chunk text
    pub text: String,

    /// Length of `text` in characters
    pub char_len: usize,

    /// 1-based page number the chunk was cut from
    pub page: usize,

    /// Byte offset of `text` inside the normalized page text
    pub start: usize,

    /// Name of the extraction backend that produced the page text
    pub backend: String,

    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,
}

impl Chunk {
    /// Create a chunk stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use leasewise_domain::Chunk;
    ///
    /// let chunk = Chunk::new("lease.pdf", 0, "Monthly rent: $2,500", "pdf-extract");
    /// assert_eq!(chunk.char_len, 20);
    /// assert_eq!(chunk.page, 1);
    /// ```
    pub fn new(
        doc_id: impl Into<String>,
        ordinal: usize,
        text: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            doc_id: doc_id.into(),
            ordinal,
            char_len: text.chars().count(),
            text,
            page: 1,
            start: 0,
            backend: backend.into(),
            created_at: crate::unix_now(),
        }
    }

    /// Set the page location of the chunk
    pub fn at(mut self, page: usize, start: usize) -> Self {
        self.page = page;
        self.start = start;
        self
    }

    /// Stable identifier combining document id and ordinal
    pub fn id(&self) -> String {
        format!("{}#{}", self.doc_id, self.ordinal)
    }

    /// Byte offset one past the end of `text` inside its page
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_characters() {
        let chunk = Chunk::new("doc", 3, "S$ 1.000 — ok", "plain-text");
        assert_eq!(chunk.char_len, 13);
        assert!(chunk.text.len() > chunk.char_len);
    }

    #[test]
    fn test_id_and_end() {
        let chunk = Chunk::new("lease.pdf", 7, "abc", "lopdf").at(2, 10);
        assert_eq!(chunk.id(), "lease.pdf#7");
        assert_eq!(chunk.page, 2);
        assert_eq!(chunk.end(), 13);
    }
}
