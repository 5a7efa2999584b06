use std::fmt::{Display, Formatter};

use crate::model::{
    AppEntry, ContactEntry, HistoryEntry, PhoneEntry, ResultEntry, SettingEntry, ShortcutEntry,
    SuggestionEntry, TagGroupEntry,
};
use crate::normalizer::NormalizedText;
use crate::searcher::CancellationToken;

/// Provider priorities used for score ties: apps above shortcuts above
/// contacts, with query-derived suggestions last.
pub const PRIORITY_APP: u8 = 0;
pub const PRIORITY_SHORTCUT: u8 = 1;
pub const PRIORITY_CONTACT: u8 = 2;
pub const PRIORITY_HISTORY: u8 = 3;
pub const PRIORITY_SETTING: u8 = 4;
pub const PRIORITY_TAG: u8 = 5;
pub const PRIORITY_PHONE: u8 = 6;
pub const PRIORITY_SUGGESTION: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// One data domain's candidate source. `fetch` hands back a lazy sequence;
/// implementations backed by slow I/O should check the token between yielded
/// items, not only at the start.
pub trait Provider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn priority(&self) -> u8;
    fn fetch(
        &self,
        query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError>;
}

/// Wraps an in-memory candidate list in a per-item cancellation check.
fn cancellable(
    entries: Vec<ResultEntry>,
    token: &CancellationToken,
) -> Box<dyn Iterator<Item = ResultEntry> + Send> {
    let token = token.clone();
    Box::new(
        entries
            .into_iter()
            .take_while(move |_| !token.is_cancelled()),
    )
}

pub struct AppProvider {
    apps: Vec<ResultEntry>,
}

impl AppProvider {
    pub fn from_apps(apps: Vec<AppEntry>) -> Self {
        Self {
            apps: apps.into_iter().map(ResultEntry::App).collect(),
        }
    }

    pub fn deterministic_fixture() -> Self {
        Self::from_apps(vec![
            AppEntry::new("app-camera", "Camera", "/usr/bin/camera", &[]),
            AppEntry::new("app-calc", "Calculator", "/usr/bin/calculator", &["math"]),
            AppEntry::new(
                "app-code",
                "Visual Studio Code",
                "/usr/bin/code",
                &["editor"],
            ),
            AppEntry::new("app-term", "Terminal", "/usr/bin/terminal", &["console"]),
        ])
    }
}

impl Provider for AppProvider {
    fn provider_name(&self) -> &'static str {
        "apps"
    }

    fn priority(&self) -> u8 {
        PRIORITY_APP
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.apps.clone(), token))
    }
}

pub struct ContactProvider {
    contacts: Vec<ResultEntry>,
}

impl ContactProvider {
    pub fn from_contacts(contacts: Vec<ContactEntry>) -> Self {
        Self {
            contacts: contacts.into_iter().map(ResultEntry::Contact).collect(),
        }
    }

    pub fn deterministic_fixture() -> Self {
        Self::from_contacts(vec![
            ContactEntry::new("contact-ada", "Ada Lovelace", "ada", "+33 1 23 45 67 89"),
            ContactEntry::new("contact-rene", "René Descartes", "", "+33 6 11 22 33 44"),
        ])
    }
}

impl Provider for ContactProvider {
    fn provider_name(&self) -> &'static str {
        "contacts"
    }

    fn priority(&self) -> u8 {
        PRIORITY_CONTACT
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.contacts.clone(), token))
    }
}

pub struct SettingsProvider {
    settings: Vec<ResultEntry>,
}

impl SettingsProvider {
    pub fn from_settings(settings: Vec<SettingEntry>) -> Self {
        Self {
            settings: settings.into_iter().map(ResultEntry::Setting).collect(),
        }
    }

    pub fn deterministic_fixture() -> Self {
        Self::from_settings(vec![
            SettingEntry::new("setting-wifi", "Wi-Fi", "network"),
            SettingEntry::new("setting-display", "Display", "display"),
            SettingEntry::new("setting-battery", "Battery", "power"),
        ])
    }
}

impl Provider for SettingsProvider {
    fn provider_name(&self) -> &'static str {
        "settings"
    }

    fn priority(&self) -> u8 {
        PRIORITY_SETTING
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.settings.clone(), token))
    }
}

pub struct ShortcutProvider {
    shortcuts: Vec<ResultEntry>,
}

impl ShortcutProvider {
    pub fn from_shortcuts(shortcuts: Vec<ShortcutEntry>) -> Self {
        Self {
            shortcuts: shortcuts.into_iter().map(ResultEntry::Shortcut).collect(),
        }
    }

    pub fn deterministic_fixture() -> Self {
        Self::from_shortcuts(vec![ShortcutEntry::new(
            "shortcut-compose",
            "Compose mail",
            "Mail",
            "/usr/bin/mail",
        )])
    }
}

impl Provider for ShortcutProvider {
    fn provider_name(&self) -> &'static str {
        "shortcuts"
    }

    fn priority(&self) -> u8 {
        PRIORITY_SHORTCUT
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.shortcuts.clone(), token))
    }
}

pub struct TagProvider {
    tags: Vec<ResultEntry>,
}

impl TagProvider {
    pub fn from_tags(tags: Vec<TagGroupEntry>) -> Self {
        Self {
            tags: tags.into_iter().map(ResultEntry::TagGroup).collect(),
        }
    }
}

impl Provider for TagProvider {
    fn provider_name(&self) -> &'static str {
        "tags"
    }

    fn priority(&self) -> u8 {
        PRIORITY_TAG
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.tags.clone(), token))
    }
}

pub struct HistoryProvider {
    entries: Vec<ResultEntry>,
}

impl HistoryProvider {
    /// Recent launches, already resolved to display names by the composition
    /// root. Serves the browse view when the query box is empty.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(ResultEntry::History).collect(),
        }
    }
}

impl Provider for HistoryProvider {
    fn provider_name(&self) -> &'static str {
        "history"
    }

    fn priority(&self) -> u8 {
        PRIORITY_HISTORY
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Ok(cancellable(self.entries.clone(), token))
    }
}

/// Offers "call this number" when the query itself is dialable.
pub struct PhoneDialerProvider;

fn is_dialable(query: &NormalizedText) -> bool {
    !query.is_empty()
        && query
            .code_points()
            .iter()
            .all(|&ch| ch.is_ascii_digit() || matches!(ch, '+' | ' ' | '-' | '.' | '(' | ')'))
        && query.code_points().iter().any(|ch| ch.is_ascii_digit())
}

impl Provider for PhoneDialerProvider {
    fn provider_name(&self) -> &'static str {
        "phone"
    }

    fn priority(&self) -> u8 {
        PRIORITY_PHONE
    }

    fn fetch(
        &self,
        query: &NormalizedText,
        _token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        let entries = if is_dialable(query) {
            vec![ResultEntry::Phone(PhoneEntry::new(query.original().trim()))]
        } else {
            Vec::new()
        };
        Ok(Box::new(entries.into_iter()))
    }
}

/// Always offers a web search for non-empty queries.
pub struct SuggestionProvider {
    url_template: String,
}

impl SuggestionProvider {
    pub fn new(url_template: &str) -> Self {
        Self {
            url_template: url_template.to_string(),
        }
    }

    pub fn deterministic_fixture() -> Self {
        Self::new("https://duckduckgo.com/?q={q}")
    }
}

impl Provider for SuggestionProvider {
    fn provider_name(&self) -> &'static str {
        "suggestions"
    }

    fn priority(&self) -> u8 {
        PRIORITY_SUGGESTION
    }

    fn fetch(
        &self,
        query: &NormalizedText,
        _token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        let entries = if query.is_empty() {
            Vec::new()
        } else {
            vec![ResultEntry::SearchSuggestion(SuggestionEntry::new(
                query.original().trim(),
                &self.url_template,
            ))]
        };
        Ok(Box::new(entries.into_iter()))
    }
}

/// Test double: fails every fetch so provider isolation can be asserted.
pub struct FailingProvider {
    pub reason: &'static str,
}

impl Provider for FailingProvider {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    fn priority(&self) -> u8 {
        PRIORITY_SETTING
    }

    fn fetch(
        &self,
        _query: &NormalizedText,
        _token: &CancellationToken,
    ) -> Result<Box<dyn Iterator<Item = ResultEntry> + Send>, ProviderError> {
        Err(ProviderError::new(self.reason))
    }
}
