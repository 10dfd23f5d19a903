//! Separator-priority text chunking
//!
//! Text is first cut into contiguous pieces no longer than `chunk_size`,
//! trying separators in priority order and only descending to the next
//! separator for pieces that are still too long. Pieces are then merged
//! greedily into chunks, and each chunk after the first starts with the
//! trailing pieces of its predecessor (up to `overlap` characters).
//!
//! Separators stay attached to the piece they end, so every chunk is an
//! exact slice of the page text and consecutive chunks share an exact
//! overlap.

use leasewise_domain::Chunk;
use std::ops::Range;
use tracing::debug;

/// Separators in priority order; the empty separator marks a piece as atomic
pub const DEFAULT_SEPARATORS: [&str; 6] = ["\n\n", "\n", "。", ". ", " ", ""];

/// Default maximum chunk length in characters
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Recursive separator splitter
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker
    ///
    /// `chunk_size` is clamped to at least 1 and `overlap` to less than
    /// `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Maximum chunk length in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split normalized pages of one document into chunks
    ///
    /// Ordinals run across pages starting at 0. Blank pages produce no
    /// chunks.
    pub fn split(&self, doc_id: &str, backend: &str, pages: &[String]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            for range in self.split_text(page) {
                let text = &page[range.clone()];
                if text.trim().is_empty() {
                    continue;
                }
                chunks.push(
                    Chunk::new(doc_id, chunks.len(), text, backend).at(page_idx + 1, range.start),
                );
            }
        }
        debug!("Split {} page(s) into {} chunks", pages.len(), chunks.len());
        chunks
    }

    /// Byte ranges of the chunks of a single text
    pub fn split_text(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.split_pieces(text, 0..text.len(), 0, &mut pieces);
        self.merge(text, &absorb_whitespace(text, &pieces))
    }

    fn split_pieces(&self, text: &str, range: Range<usize>, sep_idx: usize, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        if char_len(slice) <= self.chunk_size {
            out.push(range);
            return;
        }

        let found = DEFAULT_SEPARATORS[sep_idx.min(DEFAULT_SEPARATORS.len())..]
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || slice.contains(**sep));
        let (offset, separator) = match found {
            Some((offset, sep)) if !sep.is_empty() => (offset, *sep),
            // No separator applies: keep the oversized piece whole
            _ => {
                out.push(range);
                return;
            }
        };
        let next_idx = sep_idx + offset + 1;

        let mut piece_start = 0;
        for (at, _) in slice.match_indices(separator) {
            let piece_end = at + separator.len();
            self.push_piece(text, range.start + piece_start..range.start + piece_end, next_idx, out);
            piece_start = piece_end;
        }
        if piece_start < slice.len() {
            self.push_piece(text, range.start + piece_start..range.end, next_idx, out);
        }
    }

    fn push_piece(&self, text: &str, range: Range<usize>, next_idx: usize, out: &mut Vec<Range<usize>>) {
        if char_len(&text[range.clone()]) <= self.chunk_size {
            out.push(range);
        } else {
            self.split_pieces(text, range, next_idx, out);
        }
    }

    fn merge(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let lengths: Vec<usize> = pieces.iter().map(|p| char_len(&text[p.clone()])).collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < pieces.len() {
            let mut end = start;
            let mut size = 0;
            while end < pieces.len() {
                if end > start && size + lengths[end] > self.chunk_size {
                    break;
                }
                size += lengths[end];
                end += 1;
            }
            chunks.push(pieces[start].start..pieces[end - 1].end);
            if end == pieces.len() {
                break;
            }

            // Carry trailing pieces forward while they fit the overlap and
            // still leave room for the next new piece.
            let mut next = end;
            let mut carried = 0;
            while next > start + 1 {
                let len = lengths[next - 1];
                if carried + len > self.overlap || carried + len + lengths[end] > self.chunk_size {
                    break;
                }
                carried += len;
                next -= 1;
            }
            start = next;
        }
        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Fold whitespace-only pieces into their neighbours so no chunk is blank
fn absorb_whitespace(text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut out: Vec<Range<usize>> = Vec::with_capacity(pieces.len());
    let mut leading: Option<usize> = None;
    for piece in pieces {
        if !text[piece.clone()].trim().is_empty() {
            let start = leading.take().unwrap_or(piece.start);
            out.push(start..piece.end);
        } else if let Some(prev) = out.last_mut() {
            prev.end = piece.end;
        } else if leading.is_none() {
            leading = Some(piece.start);
        }
    }
    if let Some(start) = leading {
        out.push(start..text.len());
    }
    out
}

/// Rebuild page texts from chunks by dropping the overlapping prefixes
///
/// Pages are returned in order of first appearance.
pub fn reassemble(chunks: &[Chunk]) -> Vec<String> {
    let mut pages: Vec<(usize, String, usize)> = Vec::new();
    for chunk in chunks {
        match pages.last_mut() {
            Some((page, text, end)) if *page == chunk.page => {
                let skip = end.saturating_sub(chunk.start).min(chunk.text.len());
                text.push_str(&chunk.text[skip..]);
                *end = (*end).max(chunk.end());
            }
            _ => pages.push((chunk.page, chunk.text.clone(), chunk.end())),
        }
    }
    pages.into_iter().map(|(_, text, _)| text).collect()
}
