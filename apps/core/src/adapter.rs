use std::sync::{Arc, Mutex, RwLock};

use crate::effects::{LaunchError, SideEffects};
use crate::model::{ResultKind, ScoredResult};

/// Identity returned for an index the display asks about after a concurrent
/// update shrank the list. A defined value, never a panic.
pub const STALE_STABLE_ID: u64 = u64::MAX;

/// Display layers register one of these to hear about list changes. Called
/// exactly once per completed search turn and once per removal; never called
/// for cancelled turns. Implementations must not re-enter the search
/// coordinator from the callback.
pub trait ResultsListener: Send + Sync {
    fn on_results_changed(&self, results: &[ScoredResult], query: &str);
}

#[derive(Clone, Default)]
struct Snapshot {
    rows: Arc<Vec<ScoredResult>>,
    query: String,
}

/// Holds the currently displayed ordered results. Single writer (the most
/// recently completed turn, or a removal), many readers (the display
/// mid-render keeps its `Arc` snapshot alive across a concurrent `replace`).
pub struct ResultStore {
    snapshot: RwLock<Snapshot>,
    listeners: Mutex<Vec<Box<dyn ResultsListener>>>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Box<dyn ResultsListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }

    pub fn count(&self) -> usize {
        self.read().rows.len()
    }

    pub fn item_at(&self, index: usize) -> Option<ScoredResult> {
        self.read().rows.get(index).cloned()
    }

    pub fn view_kind(&self, index: usize) -> Option<ResultKind> {
        self.read().rows.get(index).map(|row| row.entry.kind())
    }

    /// Stable identity for animations and view recycling; out-of-range
    /// requests get the sentinel instead of a fault.
    pub fn stable_id(&self, index: usize) -> u64 {
        self.read()
            .rows
            .get(index)
            .map(|row| row.entry.stable_display_id())
            .unwrap_or(STALE_STABLE_ID)
    }

    /// The full ordered list plus the query it answers, as one consistent
    /// pair.
    pub fn current(&self) -> (Arc<Vec<ScoredResult>>, String) {
        let snapshot = self.read();
        (snapshot.rows.clone(), snapshot.query.clone())
    }

    /// Atomically swaps in a new ordered list and notifies listeners. Safe to
    /// call while a reader is mid-render of the old list.
    pub fn replace(&self, results: Vec<ScoredResult>, query: &str) {
        let rows = Arc::new(results);
        {
            let mut snapshot = self
                .snapshot
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            snapshot.rows = rows.clone();
            snapshot.query = query.to_string();
        }
        self.notify(&rows, query);
    }

    /// Removes one item by stable id, invoking the external deletion side
    /// effect exactly once before notifying. Returns `Ok(false)` when the id
    /// is no longer in the list (a concurrent turn already replaced it). The
    /// effect runs before the snapshot mutates, so a failed deletion leaves
    /// the displayed list exactly as it was.
    pub fn remove(&self, id: &str, effects: &dyn SideEffects) -> Result<bool, LaunchError> {
        let entry = {
            let snapshot = self.read();
            match snapshot.rows.iter().find(|row| row.entry.id() == id) {
                Some(row) => row.entry.clone(),
                None => return Ok(false),
            }
        };

        effects.delete(&entry)?;

        let (rows, query) = {
            let mut snapshot = self
                .snapshot
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let Some(index) = snapshot.rows.iter().position(|row| row.entry.id() == id) else {
                // A newer turn replaced the list while the effect ran; the
                // deletion itself still happened.
                return Ok(true);
            };

            let mut remaining = snapshot.rows.as_ref().clone();
            remaining.remove(index);
            snapshot.rows = Arc::new(remaining);
            (snapshot.rows.clone(), snapshot.query.clone())
        };

        self.notify(&rows, &query);
        Ok(true)
    }

    pub fn clear(&self) {
        self.replace(Vec::new(), "");
    }

    fn read(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn notify(&self, rows: &[ScoredResult], query: &str) {
        let Ok(listeners) = self.listeners.lock() else {
            return;
        };
        for listener in listeners.iter() {
            listener.on_results_changed(rows, query);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{ResultStore, ResultsListener, STALE_STABLE_ID};
    use crate::effects::{LaunchError, RecordingEffects};
    use crate::model::{AppEntry, ResultEntry, ResultKind, ScoredResult};

    fn row(id: &str, name: &str) -> ScoredResult {
        ScoredResult {
            entry: ResultEntry::App(AppEntry::new(id, name, "/bin/true", &[])),
            score: 100,
            positions: vec![0],
            matched_field: 0,
            weight: 0,
            provider_priority: 0,
        }
    }

    #[test]
    fn out_of_range_index_yields_sentinel_identity() {
        let store = ResultStore::new();
        store.replace(vec![row("a", "Alpha")], "al");

        assert_eq!(store.count(), 1);
        assert_eq!(store.stable_id(24), STALE_STABLE_ID);
        assert!(store.item_at(24).is_none());
        assert!(store.view_kind(24).is_none());
    }

    #[test]
    fn replace_swaps_list_and_query_atomically() {
        let store = ResultStore::new();
        store.replace(vec![row("a", "Alpha"), row("b", "Beta")], "a");
        let (old_rows, _) = store.current();

        store.replace(vec![row("c", "Gamma")], "g");

        // The reader's old snapshot survives the swap untouched.
        assert_eq!(old_rows.len(), 2);
        let (rows, query) = store.current();
        assert_eq!(rows.len(), 1);
        assert_eq!(query, "g");
        assert_eq!(store.view_kind(0), Some(ResultKind::App));
    }

    #[test]
    fn remove_fires_delete_effect_exactly_once() {
        let store = ResultStore::new();
        let effects = RecordingEffects::default();
        store.replace(vec![row("a", "Alpha"), row("b", "Beta")], "");

        assert!(store.remove("a", &effects).expect("remove should succeed"));
        assert!(!store.remove("a", &effects).expect("second remove is a no-op"));

        let deleted = effects.deleted.lock().expect("lock");
        assert_eq!(deleted.as_slice(), &["a".to_string()]);
        assert_eq!(store.count(), 1);
        assert_eq!(store.item_at(0).map(|r| r.entry.id().to_string()), Some("b".into()));
    }

    #[test]
    fn failed_delete_effect_leaves_the_store_untouched() {
        struct RefusingEffects;
        impl crate::effects::SideEffects for RefusingEffects {
            fn launch(&self, _entry: &ResultEntry) -> Result<(), LaunchError> {
                Ok(())
            }

            fn delete(&self, _entry: &ResultEntry) -> Result<(), LaunchError> {
                Err(LaunchError::Unsupported("app"))
            }
        }

        struct Counter(Arc<AtomicUsize>);
        impl ResultsListener for Counter {
            fn on_results_changed(&self, _results: &[ScoredResult], _query: &str) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let store = ResultStore::new();
        let notifications = Arc::new(AtomicUsize::new(0));
        store.add_listener(Box::new(Counter(notifications.clone())));
        store.replace(vec![row("a", "Alpha")], "al");

        assert!(store.remove("a", &RefusingEffects).is_err());

        // The item is still displayed and no change was announced.
        assert_eq!(store.count(), 1);
        assert_eq!(
            store.item_at(0).map(|r| r.entry.id().to_string()),
            Some("a".into())
        );
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_hear_every_update() {
        struct Counter(Arc<AtomicUsize>);
        impl ResultsListener for Counter {
            fn on_results_changed(&self, _results: &[ScoredResult], _query: &str) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let store = ResultStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        store.add_listener(Box::new(Counter(count.clone())));

        store.replace(vec![row("a", "Alpha")], "a");
        store
            .remove("a", &RecordingEffects::default())
            .expect("remove should succeed");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
