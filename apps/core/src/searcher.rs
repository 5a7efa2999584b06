use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread;

use crate::adapter::ResultStore;
use crate::fuzzy::{FuzzyScorer, MatchInfo};
use crate::logging;
use crate::model::{ResultEntry, ScoredResult};
use crate::normalizer::{normalize, NormalizedText};
use crate::provider::Provider;

/// Cooperative cancellation flag shared by one turn's workers. Checked before
/// each provider fetch step and before scoring each candidate; never
/// preemptive.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// What the query box asks for. Browse mode is an explicit flag, not ambient
/// state: it ignores the text and matches every candidate at the usage-weight
/// baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub browse_all: bool,
}

impl SearchRequest {
    pub fn filter(text: &str) -> Self {
        Self {
            text: text.to_string(),
            browse_all: false,
        }
    }

    pub fn browse() -> Self {
        Self {
            text: String::new(),
            browse_all: true,
        }
    }
}

/// One query-to-results execution. Created per keystroke, discarded when a
/// newer turn supersedes it.
pub struct SearchTurn {
    query: NormalizedText,
    raw_query: String,
    token: CancellationToken,
    state: Mutex<TurnState>,
    terminal: Condvar,
}

impl SearchTurn {
    fn new(query: NormalizedText, raw_query: String) -> Arc<Self> {
        Arc::new(Self {
            query,
            raw_query,
            token: CancellationToken::new(),
            state: Mutex::new(TurnState::Pending),
            terminal: Condvar::new(),
        })
    }

    pub fn query(&self) -> &NormalizedText {
        &self.query
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn state(&self) -> TurnState {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocks until the turn reaches `Completed` or `Cancelled`.
    pub fn wait(&self) -> TurnState {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !state.is_terminal() {
            state = self
                .terminal
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *state
    }

    /// Advances the state machine; terminal states are final.
    fn transition(&self, next: TurnState) -> bool {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.is_terminal() {
            return false;
        }
        *state = next;
        if next.is_terminal() {
            self.terminal.notify_all();
        }
        true
    }

    fn cancel(&self) {
        self.token.cancel();
        self.transition(TurnState::Cancelled);
    }
}

struct CoordinatorInner {
    providers: Vec<Arc<dyn Provider>>,
    store: Arc<ResultStore>,
    max_results: usize,
    // Doubles as the delivery gate: cancellation of the previous turn and
    // delivery of a turn's results are serialized through this lock, so once
    // `submit` returns the superseded turn can never reach the store.
    current: Mutex<Option<Arc<SearchTurn>>>,
}

/// Orchestrates search turns: at most one `Running` turn per query box;
/// submitting a new one deterministically cancels the previous one first.
pub struct SearchCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SearchCoordinator {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        store: Arc<ResultStore>,
        max_results: usize,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                providers,
                store,
                max_results,
                current: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.inner.store
    }

    /// Starts a new search turn off the calling thread. Any in-flight turn is
    /// cancelled before this returns; its results will never be delivered
    /// afterwards.
    pub fn submit(
        &self,
        request: &SearchRequest,
        weights: HashMap<String, u32>,
    ) -> Arc<SearchTurn> {
        let query = if request.browse_all {
            normalize("")
        } else {
            normalize(&request.text)
        };
        let turn = SearchTurn::new(query, request.text.trim().to_string());

        {
            let mut current = self
                .inner
                .current
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(previous) = current.take() {
                previous.cancel();
            }
            *current = Some(turn.clone());
        }

        turn.transition(TurnState::Running);
        let inner = self.inner.clone();
        let worker_turn = turn.clone();
        thread::spawn(move || run_turn(&inner, &worker_turn, &weights));
        turn
    }

    /// Cancels the in-flight turn, if any, without starting a new one.
    pub fn cancel_current(&self) {
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }
}

fn run_turn(
    inner: &Arc<CoordinatorInner>,
    turn: &Arc<SearchTurn>,
    weights: &HashMap<String, u32>,
) {
    let scorer = FuzzyScorer::new(turn.query());
    let (sender, receiver) = mpsc::channel::<(u8, ResultEntry)>();

    let mut workers = Vec::with_capacity(inner.providers.len());
    for provider in &inner.providers {
        let provider = provider.clone();
        let sender = sender.clone();
        let token = turn.token().clone();
        let query = turn.query().clone();
        workers.push(thread::spawn(move || {
            if token.is_cancelled() {
                return;
            }
            match provider.fetch(&query, &token) {
                Ok(entries) => {
                    for entry in entries {
                        if token.is_cancelled() {
                            return;
                        }
                        if sender.send((provider.priority(), entry)).is_err() {
                            return;
                        }
                    }
                }
                Err(error) => {
                    // One provider failing never fails the turn.
                    logging::warn(&format!(
                        "provider '{}' unavailable: {error}",
                        provider.provider_name()
                    ));
                }
            }
        }));
    }
    drop(sender);

    let mut collected: Vec<ScoredResult> = Vec::new();
    let mut cancelled = false;
    for (priority, entry) in receiver.iter() {
        if turn.token().is_cancelled() {
            cancelled = true;
            break;
        }
        if let Some(scored) = score_entry(&scorer, entry, priority, weights) {
            collected.push(scored);
        }
    }

    for worker in workers {
        let _ = worker.join();
    }

    if cancelled || turn.token().is_cancelled() {
        turn.transition(TurnState::Cancelled);
        return;
    }

    collected.sort_by(ScoredResult::rank_cmp);
    collected.truncate(inner.max_results);

    let current = inner
        .current
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if turn.token().is_cancelled() {
        drop(current);
        turn.transition(TurnState::Cancelled);
        return;
    }
    inner.store.replace(collected, turn.raw_query());
    turn.transition(TurnState::Completed);
}

/// Scores every matchable field of one candidate, keeping the best. `None`
/// drops the candidate from the turn entirely.
fn score_entry(
    scorer: &FuzzyScorer,
    entry: ResultEntry,
    priority: u8,
    weights: &HashMap<String, u32>,
) -> Option<ScoredResult> {
    let best = {
        let mut best: Option<(usize, MatchInfo)> = None;
        for (index, field) in entry.match_fields().into_iter().enumerate() {
            if field.is_empty() && !scorer.query_is_empty() {
                continue;
            }
            if let Some(info) = scorer.score(field) {
                let improves = best
                    .as_ref()
                    .map(|(_, current)| info.score > current.score)
                    .unwrap_or(true);
                if improves {
                    best = Some((index, info));
                }
            }
        }
        best
    };

    let (matched_field, info) = best?;
    let weight = weights.get(entry.id()).copied().unwrap_or(0);
    Some(ScoredResult {
        entry,
        score: info.score,
        positions: info.positions,
        matched_field,
        weight,
        provider_priority: priority,
    })
}
