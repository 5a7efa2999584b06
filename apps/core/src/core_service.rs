use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::adapter::ResultStore;
use crate::config::{validate, Config};
use crate::contract::{
    CoreRequest, CoreResponse, DeleteResponse, LaunchResponse, SearchResponse, SearchResultDto,
};
use crate::effects::{LaunchError, SideEffects};
use crate::history::{self, HistoryError};
use crate::model::ScoredResult;
use crate::provider::Provider;
use crate::searcher::{SearchCoordinator, SearchRequest, SearchTurn, TurnState};

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    History(HistoryError),
    Launch(LaunchError),
    ItemNotFound(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::History(error) => write!(f, "history error: {error}"),
            Self::Launch(error) => write!(f, "launch error: {error}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<HistoryError> for ServiceError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<LaunchError> for ServiceError {
    fn from(value: LaunchError) -> Self {
        Self::Launch(value)
    }
}

/// Composition root's view of the core: one coordinator, one result store,
/// one usage-history connection, and the host's side-effect handlers.
pub struct CoreService {
    config: Config,
    db: Mutex<Connection>,
    coordinator: SearchCoordinator,
    effects: Arc<dyn SideEffects>,
}

impl CoreService {
    pub fn new(
        config: Config,
        providers: Vec<Arc<dyn Provider>>,
        effects: Arc<dyn SideEffects>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let db = history::open_from_config(&config)?;
        Ok(Self::assemble(config, db, providers, effects))
    }

    /// Same as `new` but over an explicit connection; used with the in-memory
    /// history db in tests.
    pub fn with_connection(
        config: Config,
        db: Connection,
        providers: Vec<Arc<dyn Provider>>,
        effects: Arc<dyn SideEffects>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        Ok(Self::assemble(config, db, providers, effects))
    }

    fn assemble(
        config: Config,
        db: Connection,
        providers: Vec<Arc<dyn Provider>>,
        effects: Arc<dyn SideEffects>,
    ) -> Self {
        let store = Arc::new(ResultStore::new());
        let coordinator = SearchCoordinator::new(providers, store, config.max_results as usize);
        Self {
            config,
            db: Mutex::new(db),
            coordinator,
            effects,
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        self.coordinator.store()
    }

    /// Starts a turn with a fresh usage-weight snapshot; returns immediately.
    pub fn submit(&self, request: &SearchRequest) -> Result<Arc<SearchTurn>, ServiceError> {
        let weights = self.weights_snapshot()?;
        Ok(self.coordinator.submit(request, weights))
    }

    /// Convenience for callers without their own display loop: runs one turn
    /// to completion and returns the delivered list. A concurrently submitted
    /// newer query can cancel it, in which case the newer results stand.
    pub fn search_blocking(&self, request: &SearchRequest) -> Result<Vec<ScoredResult>, ServiceError> {
        let turn = self.submit(request)?;
        let _ = turn.wait();
        let (rows, _) = self.store().current();
        Ok(rows.as_ref().clone())
    }

    /// Launches the currently displayed result with this id and records the
    /// launch in usage history (visible to the next turn).
    pub fn launch(&self, id: &str) -> Result<(), ServiceError> {
        let (rows, _) = self.store().current();
        let row = rows
            .iter()
            .find(|row| row.entry.id() == id)
            .ok_or_else(|| ServiceError::ItemNotFound(id.to_string()))?;

        self.effects.launch(&row.entry)?;
        let db = self
            .db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        history::record_launch(&db, id)?;
        Ok(())
    }

    /// Removes one displayed result: deletion side effect, history forget,
    /// display notification. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let removed = self.store().remove(id, self.effects.as_ref())?;
        if removed {
            let db = self
                .db
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            history::forget(&db, id)?;
        }
        Ok(removed)
    }

    pub fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Search(search) => {
                let request = SearchRequest {
                    text: search.query,
                    browse_all: search.browse_all,
                };
                let mut rows = self.search_blocking(&request)?;
                if let Some(limit) = search.limit {
                    rows.truncate(limit);
                }
                Ok(CoreResponse::Search(SearchResponse {
                    query: request.text,
                    results: rows.iter().map(SearchResultDto::from).collect(),
                }))
            }
            CoreRequest::Launch(launch) => {
                self.launch(&launch.id)?;
                Ok(CoreResponse::Launch(LaunchResponse { launched: true }))
            }
            CoreRequest::Delete(delete) => {
                let removed = self.delete(&delete.id)?;
                Ok(CoreResponse::Delete(DeleteResponse { removed }))
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn weights_snapshot(&self) -> Result<HashMap<String, u32>, ServiceError> {
        let db = self
            .db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(history::weights(&db)?)
    }
}
