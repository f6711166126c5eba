//! Character-window chunking with overlap.
//!
//! Each page is cut independently into windows of at most `chunk_size` characters. A window that
//! ends before the end of its page is followed by one that starts `chunk_overlap` characters
//! earlier, so neighbouring chunks share context across the cut. Within the last fifth of a window
//! the cut prefers, in order: a paragraph break, a line break, a sentence end, a word boundary.
//! Without any of those the window is cut hard at `chunk_size`.
//!
//! Characters are Unicode scalar values, not bytes.

use crate::loader::PageDocument;

use super::types::{ChunkingError, TextChunk};

const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Window parameters for [`split_pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of the same page.
    pub chunk_overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingParams {
    /// Build validated parameters.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        let params = Self {
            chunk_size,
            chunk_overlap,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), ChunkingError> {
        if self.chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}

/// Split pages into an ordered chunk sequence.
///
/// Chunks keep page order and position order within a page; `index` is the position in the
/// returned vector. Whitespace-only windows are dropped before indexes are assigned.
pub fn split_pages(
    pages: &[PageDocument],
    params: ChunkingParams,
) -> Result<Vec<TextChunk>, ChunkingError> {
    params.validate()?;

    let mut chunks = Vec::new();
    for page in pages {
        for text in split_text(&page.text, params) {
            chunks.push(TextChunk {
                index: chunks.len(),
                text,
                page_index: page.page_index,
            });
        }
    }
    Ok(chunks)
}

fn split_text(text: &str, params: ChunkingParams) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < total {
        let window_end = (start + params.chunk_size).min(total);
        let end = if window_end == total {
            total
        } else {
            find_break_point(&chars, start, window_end, params.chunk_overlap)
        };

        let piece: String = chars[start..end].iter().collect();
        if !piece.trim().is_empty() {
            pieces.push(piece);
        }

        if end == total {
            break;
        }
        // `end > start + overlap`, so the window always advances.
        start = end - params.chunk_overlap;
    }

    pieces
}

/// Pick the exclusive end of a window that does not reach the end of the page.
///
/// Candidates lie in `(floor, window_end]`, where `floor` keeps the break inside the last fifth of
/// the window and strictly after `start + overlap`.
fn find_break_point(chars: &[char], start: usize, window_end: usize, overlap: usize) -> usize {
    let floor = window_end
        .saturating_sub((window_end - start) / 5)
        .max(start + overlap + 1);
    if floor > window_end {
        return window_end;
    }
    let candidates = || (floor..=window_end).rev();

    // Paragraph break.
    if let Some(end) =
        candidates().find(|&end| end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n')
    {
        return end;
    }
    // Line break.
    if let Some(end) = candidates().find(|&end| chars[end - 1] == '\n') {
        return end;
    }
    // Sentence end followed by whitespace.
    if let Some(end) = candidates()
        .find(|&end| matches!(chars[end - 1], '.' | '!' | '?') && chars[end].is_whitespace())
    {
        return end;
    }
    // Word boundary.
    if let Some(end) =
        candidates().find(|&end| chars[end].is_whitespace() || chars[end - 1].is_whitespace())
    {
        return end;
    }

    window_end
}
