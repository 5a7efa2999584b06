use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical comparison form of a raw string: lowercased, diacritics stripped,
/// interior whitespace collapsed, with a per-code-point byte offset back into
/// the original text so match positions can be highlighted on what the user
/// actually sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    original: String,
    code_points: Vec<char>,
    source_offsets: Vec<usize>,
}

impl NormalizedText {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn code_points(&self) -> &[char] {
        &self.code_points
    }

    pub fn len(&self) -> usize {
        self.code_points.len()
    }

    /// True for the distinguished "no filter" form produced by empty or
    /// whitespace-only input.
    pub fn is_empty(&self) -> bool {
        self.code_points.is_empty()
    }

    /// Byte range in the original string covered by the normalized code point
    /// at `position`. Out-of-range positions map to an empty range at the end
    /// of the original text.
    pub fn source_span(&self, position: usize) -> std::ops::Range<usize> {
        let Some(&start) = self.source_offsets.get(position) else {
            return self.original.len()..self.original.len();
        };
        let end = self.source_offsets[position + 1..]
            .iter()
            .find(|&&offset| offset > start)
            .copied()
            .unwrap_or_else(|| next_char_boundary(&self.original, start));
        start..end
    }
}

fn next_char_boundary(original: &str, start: usize) -> usize {
    original[start..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(original.len())
}

/// Normalizes `raw` for matching. Case is folded, combining marks produced by
/// NFD decomposition are dropped (so "café" and "cafe" normalize identically),
/// and whitespace runs collapse to a single space with leading/trailing
/// whitespace removed. Idempotent: normalizing an already-normalized string
/// yields the same code points.
pub fn normalize(raw: &str) -> NormalizedText {
    let mut code_points = Vec::with_capacity(raw.len());
    let mut source_offsets = Vec::with_capacity(raw.len());
    let mut pending_space: Option<usize> = None;

    for (byte_offset, ch) in raw.char_indices() {
        if ch.is_whitespace() {
            if !code_points.is_empty() && pending_space.is_none() {
                pending_space = Some(byte_offset);
            }
            continue;
        }

        if let Some(space_offset) = pending_space.take() {
            code_points.push(' ');
            source_offsets.push(space_offset);
        }

        for decomposed in ch.nfd() {
            if is_combining_mark(decomposed) {
                continue;
            }
            for folded in decomposed.to_lowercase() {
                code_points.push(folded);
                source_offsets.push(byte_offset);
            }
        }
    }

    NormalizedText {
        original: raw.to_string(),
        code_points,
        source_offsets,
    }
}

/// Normalizes raw bytes that may not be valid UTF-8. Undecodable sequences
/// degrade to the replacement character instead of failing the search.
pub fn normalize_lossy(raw: &[u8]) -> NormalizedText {
    normalize(&String::from_utf8_lossy(raw))
}
