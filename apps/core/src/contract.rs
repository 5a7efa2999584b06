use serde::{Deserialize, Serialize};

use crate::model::ScoredResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequestDto {
    pub query: String,
    #[serde(default)]
    pub browse_all: bool,
    pub limit: Option<usize>,
}

/// Byte range into the original (non-normalized) title, for the display to
/// bold matched substrings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultDto {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub score: i64,
    pub stable_id: u64,
    pub highlights: Vec<HighlightSpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResultDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchResponse {
    pub launched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum CoreRequest {
    Search(SearchRequestDto),
    Launch(LaunchRequest),
    Delete(DeleteRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum CoreResponse {
    Search(SearchResponse),
    Launch(LaunchResponse),
    Delete(DeleteResponse),
}

impl From<&ScoredResult> for SearchResultDto {
    fn from(value: &ScoredResult) -> Self {
        Self {
            id: value.entry.id().to_string(),
            kind: value.entry.kind().as_str().to_string(),
            title: value.entry.title().to_string(),
            score: value.composite_score(),
            stable_id: value.entry.stable_display_id(),
            highlights: highlight_spans(value),
        }
    }
}

/// Maps matched code-point positions back through the normalizer to byte
/// spans in the original text, merging adjacent spans so "cam" highlights one
/// run, not three slivers.
fn highlight_spans(result: &ScoredResult) -> Vec<HighlightSpan> {
    let fields = result.entry.match_fields();
    let Some(field) = fields.get(result.matched_field) else {
        return Vec::new();
    };

    let mut spans: Vec<HighlightSpan> = Vec::new();
    for &position in &result.positions {
        let range = field.source_span(position);
        if range.is_empty() {
            continue;
        }
        match spans.last_mut() {
            Some(last) if last.end == range.start => last.end = range.end,
            _ => spans.push(HighlightSpan {
                start: range.start,
                end: range.end,
            }),
        }
    }
    spans
}
