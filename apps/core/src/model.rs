use std::hash::{Hash, Hasher};

use crate::normalizer::{normalize, NormalizedText};

/// Discriminant for the closed result-variant set. The display layer recycles
/// view resources only between items of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    App,
    Contact,
    Phone,
    Setting,
    Shortcut,
    SearchSuggestion,
    TagGroup,
    History,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Contact => "contact",
            Self::Phone => "phone",
            Self::Setting => "setting",
            Self::Shortcut => "shortcut",
            Self::SearchSuggestion => "search_suggestion",
            Self::TagGroup => "tag_group",
            Self::History => "history",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub id: String,
    pub name: String,
    pub exec_path: String,
    pub tags: Vec<String>,
    normalized_name: NormalizedText,
    normalized_tags: Vec<NormalizedText>,
}

impl AppEntry {
    pub fn new(id: &str, name: &str, exec_path: &str, tags: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            exec_path: exec_path.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            normalized_name: normalize(name),
            normalized_tags: tags.iter().map(|tag| normalize(tag)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    pub id: String,
    pub name: String,
    pub nickname: String,
    pub phone: String,
    normalized_name: NormalizedText,
    normalized_nickname: NormalizedText,
}

impl ContactEntry {
    pub fn new(id: &str, name: &str, nickname: &str, phone: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            nickname: nickname.to_string(),
            phone: phone.to_string(),
            normalized_name: normalize(name),
            normalized_nickname: normalize(nickname),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneEntry {
    pub id: String,
    pub number: String,
    normalized_number: NormalizedText,
}

impl PhoneEntry {
    pub fn new(number: &str) -> Self {
        Self {
            id: format!("phone://{number}"),
            number: number.to_string(),
            normalized_number: normalize(number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEntry {
    pub id: String,
    pub name: String,
    pub page: String,
    normalized_name: NormalizedText,
}

impl SettingEntry {
    pub fn new(id: &str, name: &str, page: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            page: page.to_string(),
            normalized_name: normalize(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub id: String,
    pub name: String,
    pub owner_app: String,
    pub target: String,
    normalized_name: NormalizedText,
    normalized_owner: NormalizedText,
}

impl ShortcutEntry {
    pub fn new(id: &str, name: &str, owner_app: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            owner_app: owner_app.to_string(),
            target: target.to_string(),
            normalized_name: normalize(name),
            normalized_owner: normalize(owner_app),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionEntry {
    pub id: String,
    pub label: String,
    pub query: String,
    pub url_template: String,
    normalized_label: NormalizedText,
}

impl SuggestionEntry {
    pub fn new(query: &str, url_template: &str) -> Self {
        let label = format!("Search the web for {query}");
        Self {
            id: format!("suggestion://{query}"),
            normalized_label: normalize(&label),
            label,
            query: query.to_string(),
            url_template: url_template.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroupEntry {
    pub id: String,
    pub tag: String,
    normalized_tag: NormalizedText,
}

impl TagGroupEntry {
    pub fn new(tag: &str) -> Self {
        Self {
            id: format!("tag://{tag}"),
            tag: tag.to_string(),
            normalized_tag: normalize(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub target_id: String,
    normalized_name: NormalizedText,
}

impl HistoryEntry {
    pub fn new(target_id: &str, name: &str) -> Self {
        Self {
            id: format!("history://{target_id}"),
            name: name.to_string(),
            target_id: target_id.to_string(),
            normalized_name: normalize(name),
        }
    }
}

/// One candidate a provider can offer. A closed set: every dispatch over it
/// is an exhaustive match, there is no unknown-kind fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEntry {
    App(AppEntry),
    Contact(ContactEntry),
    Phone(PhoneEntry),
    Setting(SettingEntry),
    Shortcut(ShortcutEntry),
    SearchSuggestion(SuggestionEntry),
    TagGroup(TagGroupEntry),
    History(HistoryEntry),
}

impl ResultEntry {
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::App(_) => ResultKind::App,
            Self::Contact(_) => ResultKind::Contact,
            Self::Phone(_) => ResultKind::Phone,
            Self::Setting(_) => ResultKind::Setting,
            Self::Shortcut(_) => ResultKind::Shortcut,
            Self::SearchSuggestion(_) => ResultKind::SearchSuggestion,
            Self::TagGroup(_) => ResultKind::TagGroup,
            Self::History(_) => ResultKind::History,
        }
    }

    /// Stable unique identifier; persists across search turns for the same
    /// underlying item.
    pub fn id(&self) -> &str {
        match self {
            Self::App(entry) => &entry.id,
            Self::Contact(entry) => &entry.id,
            Self::Phone(entry) => &entry.id,
            Self::Setting(entry) => &entry.id,
            Self::Shortcut(entry) => &entry.id,
            Self::SearchSuggestion(entry) => &entry.id,
            Self::TagGroup(entry) => &entry.id,
            Self::History(entry) => &entry.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::App(entry) => &entry.name,
            Self::Contact(entry) => &entry.name,
            Self::Phone(entry) => &entry.number,
            Self::Setting(entry) => &entry.name,
            Self::Shortcut(entry) => &entry.name,
            Self::SearchSuggestion(entry) => &entry.label,
            Self::TagGroup(entry) => &entry.tag,
            Self::History(entry) => &entry.name,
        }
    }

    /// Matchable fields, primary first. The scorer keeps the best-scoring
    /// field per candidate.
    pub fn match_fields(&self) -> Vec<&NormalizedText> {
        match self {
            Self::App(entry) => {
                let mut fields = vec![&entry.normalized_name];
                fields.extend(entry.normalized_tags.iter());
                fields
            }
            Self::Contact(entry) => vec![&entry.normalized_name, &entry.normalized_nickname],
            Self::Phone(entry) => vec![&entry.normalized_number],
            Self::Setting(entry) => vec![&entry.normalized_name],
            Self::Shortcut(entry) => vec![&entry.normalized_name, &entry.normalized_owner],
            Self::SearchSuggestion(entry) => vec![&entry.normalized_label],
            Self::TagGroup(entry) => vec![&entry.normalized_tag],
            Self::History(entry) => vec![&entry.normalized_name],
        }
    }

    /// Stable `u64` identity for the display layer, derived from kind and id.
    pub fn stable_display_id(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.kind().as_str().hash(&mut hasher);
        self.id().hash(&mut hasher);
        hasher.finish()
    }
}

/// A result annotated with its best match for the current query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub entry: ResultEntry,
    /// Text relevance of the best-scoring field.
    pub score: i64,
    /// Matched code-point positions in the best field's normalized sequence.
    pub positions: Vec<usize>,
    /// Index into `entry.match_fields()` of the field the positions refer to.
    pub matched_field: usize,
    /// Usage-frequency weight snapshotted at turn start.
    pub weight: u32,
    /// Provider priority for tie-breaking; lower ranks earlier.
    pub provider_priority: u8,
}

impl ScoredResult {
    /// Composite rank: text score plus a capped usage-frequency bonus.
    pub fn composite_score(&self) -> i64 {
        self.score + ((self.weight as i64) * 12).clamp(0, 400)
    }

    /// Total order over results in a completed turn: composite score
    /// descending, then provider priority, then title, then id so equal
    /// titles cannot flip between runs.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .composite_score()
            .cmp(&self.composite_score())
            .then_with(|| self.provider_priority.cmp(&other.provider_priority))
            .then_with(|| self.entry.title().cmp(other.entry.title()))
            .then_with(|| self.entry.id().cmp(other.entry.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppEntry, ContactEntry, ResultEntry, ResultKind, ScoredResult};

    fn scored(entry: ResultEntry, score: i64, weight: u32, priority: u8) -> ScoredResult {
        ScoredResult {
            entry,
            score,
            positions: Vec::new(),
            matched_field: 0,
            weight,
            provider_priority: priority,
        }
    }

    #[test]
    fn stable_display_id_is_stable_and_kind_scoped() {
        let app = ResultEntry::App(AppEntry::new("camera", "Camera", "/usr/bin/camera", &[]));
        let again = ResultEntry::App(AppEntry::new("camera", "Camera", "/moved/camera", &[]));
        assert_eq!(app.stable_display_id(), again.stable_display_id());

        let contact = ResultEntry::Contact(ContactEntry::new("camera", "Camera", "", "555"));
        assert_ne!(app.stable_display_id(), contact.stable_display_id());
    }

    #[test]
    fn usage_weight_bonus_is_capped() {
        let entry = ResultEntry::App(AppEntry::new("a", "A", "/a", &[]));
        let light = scored(entry.clone(), 1_000, 1, 0);
        let heavy = scored(entry, 1_000, 10_000, 0);
        assert_eq!(light.composite_score(), 1_012);
        assert_eq!(heavy.composite_score(), 1_400);
    }

    #[test]
    fn rank_breaks_ties_by_priority_then_title() {
        let app = scored(
            ResultEntry::App(AppEntry::new("a", "Same", "/a", &[])),
            100,
            0,
            0,
        );
        let contact = scored(
            ResultEntry::Contact(ContactEntry::new("c", "Same", "", "555")),
            100,
            0,
            2,
        );
        assert_eq!(app.rank_cmp(&contact), std::cmp::Ordering::Less);

        let alpha = scored(
            ResultEntry::App(AppEntry::new("b", "Alpha", "/b", &[])),
            100,
            0,
            0,
        );
        assert_eq!(alpha.rank_cmp(&app), std::cmp::Ordering::Less);
    }

    #[test]
    fn match_fields_expose_alternate_names() {
        let entry = ResultEntry::App(AppEntry::new(
            "code",
            "Visual Studio Code",
            "/usr/bin/code",
            &["editor", "ide"],
        ));
        assert_eq!(entry.match_fields().len(), 3);
        assert_eq!(entry.kind(), ResultKind::App);
    }
}
