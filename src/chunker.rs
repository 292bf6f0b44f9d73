//! Diff decomposition into size-bounded chunks
//!
//! A diff is first split at per-file boundaries, then the per-file units are
//! greedily packed into chunks of at most `limit` characters. A unit that is
//! larger than the limit on its own is hard-sliced into `limit`-sized pieces.
//! Sizes are counted in characters, so a slice never splits a code point.

/// Header line that opens one file's section in a unified git diff
const FILE_HEADER: &str = "diff --git ";

/// Separator placed between units packed into the same chunk
const UNIT_SEPARATOR: &str = "\n\n";

/// Default chunk limit in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 80_000;

/// Splits commit diffs into chunks that each fit one completion prompt
#[derive(Debug, Clone, Copy)]
pub struct DiffChunker {
    max_chunk_chars: usize,
}

impl DiffChunker {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self {
            max_chunk_chars: max_chunk_chars.max(1),
        }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    /// Split and pack a diff in one step
    pub fn chunk(&self, diff_text: &str) -> Vec<String> {
        pack(&split_by_unit(diff_text), self.max_chunk_chars)
    }
}

impl Default for DiffChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

/// Split a unified diff into one unit per file
///
/// Any preamble before the first file header becomes its own unit.
/// Whitespace-only input yields no units.
pub fn split_by_unit(diff_text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();

    for line in diff_text.split_inclusive('\n') {
        if line.starts_with(FILE_HEADER) {
            push_unit(&mut units, &mut current);
        }
        current.push_str(line);
    }
    push_unit(&mut units, &mut current);

    units
}

fn push_unit(units: &mut Vec<String>, current: &mut String) {
    let unit = std::mem::take(current);
    let unit = unit.trim_end_matches(['\n', '\r']);
    if !unit.trim().is_empty() {
        units.push(unit.to_string());
    }
}

/// Greedily pack units into chunks of at most `limit` characters
///
/// Units sharing a chunk are joined by a blank line, and the separator counts
/// toward the limit. Order is preserved: chunks are emitted in unit order and
/// slices of an oversized unit are emitted consecutively.
pub fn pack(units: &[String], limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for unit in units.iter().filter(|u| !u.is_empty()) {
        let unit_len = unit.chars().count();

        if unit_len > limit {
            flush(&mut chunks, &mut buffer, &mut buffer_len);
            chunks.extend(slice_chars(unit, limit));
            continue;
        }

        let separator_len = if buffer.is_empty() {
            0
        } else {
            UNIT_SEPARATOR.len()
        };
        if buffer_len + separator_len + unit_len > limit {
            flush(&mut chunks, &mut buffer, &mut buffer_len);
        }

        if !buffer.is_empty() {
            buffer.push_str(UNIT_SEPARATOR);
            buffer_len += UNIT_SEPARATOR.len();
        }
        buffer.push_str(unit);
        buffer_len += unit_len;
    }
    flush(&mut chunks, &mut buffer, &mut buffer_len);

    chunks
}

fn flush(chunks: &mut Vec<String>, buffer: &mut String, buffer_len: &mut usize) {
    if !buffer.is_empty() {
        chunks.push(std::mem::take(buffer));
    }
    *buffer_len = 0;
}

/// Cut text into consecutive pieces of exactly `limit` characters (last one shorter)
fn slice_chars(text: &str, limit: usize) -> Vec<String> {
    let mut slices = Vec::new();
    let mut start = 0usize;

    for (count, (offset, _)) in text.char_indices().enumerate() {
        if count > 0 && count % limit == 0 {
            slices.push(text[start..offset].to_string());
            start = offset;
        }
    }
    if start < text.len() {
        slices.push(text[start..].to_string());
    }

    slices
}
