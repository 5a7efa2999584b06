use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::ResultEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    EmptyTarget,
    MissingPath(PathBuf),
    Unsupported(&'static str),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTarget => write!(f, "empty launch target"),
            Self::MissingPath(path) => write!(f, "path does not exist: {}", path.display()),
            Self::Unsupported(kind) => write!(f, "no launch handler for kind: {kind}"),
        }
    }
}

impl std::error::Error for LaunchError {}

/// Launch and delete side effects are owned by the host shell; the core only
/// invokes them. Implementations must tolerate concurrent calls.
pub trait SideEffects: Send + Sync {
    fn launch(&self, entry: &ResultEntry) -> Result<(), LaunchError>;
    fn delete(&self, entry: &ResultEntry) -> Result<(), LaunchError>;
}

/// Default host: launches filesystem-backed entries by validating their
/// target path; everything else is reported unsupported rather than guessed.
pub struct FilesystemEffects;

impl SideEffects for FilesystemEffects {
    fn launch(&self, entry: &ResultEntry) -> Result<(), LaunchError> {
        match entry {
            ResultEntry::App(app) => launch_path(&app.exec_path),
            ResultEntry::Shortcut(shortcut) => launch_path(&shortcut.target),
            ResultEntry::History(_) => Ok(()),
            ResultEntry::SearchSuggestion(_) => Ok(()),
            ResultEntry::Contact(_) => Err(LaunchError::Unsupported("contact")),
            ResultEntry::Phone(_) => Err(LaunchError::Unsupported("phone")),
            ResultEntry::Setting(_) => Err(LaunchError::Unsupported("setting")),
            ResultEntry::TagGroup(_) => Err(LaunchError::Unsupported("tag_group")),
        }
    }

    fn delete(&self, _entry: &ResultEntry) -> Result<(), LaunchError> {
        // Forgetting an item only touches core-owned state (history rows);
        // there is nothing to undo on the filesystem.
        Ok(())
    }
}

pub fn launch_path(path: &str) -> Result<(), LaunchError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::EmptyTarget);
    }

    let candidate = Path::new(trimmed);
    if !candidate.exists() {
        return Err(LaunchError::MissingPath(candidate.to_path_buf()));
    }

    Ok(())
}

/// Test double that records every invocation; used to assert a deletion side
/// effect fires exactly once.
#[derive(Default)]
pub struct RecordingEffects {
    pub launched: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl SideEffects for RecordingEffects {
    fn launch(&self, entry: &ResultEntry) -> Result<(), LaunchError> {
        self.launched
            .lock()
            .map_err(|_| LaunchError::EmptyTarget)?
            .push(entry.id().to_string());
        Ok(())
    }

    fn delete(&self, entry: &ResultEntry) -> Result<(), LaunchError> {
        self.deleted
            .lock()
            .map_err(|_| LaunchError::EmptyTarget)?
            .push(entry.id().to_string());
        Ok(())
    }
}
