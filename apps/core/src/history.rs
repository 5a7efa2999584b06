use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use crate::config::Config;

#[derive(Debug)]
pub enum HistoryError {
    Io(std::io::Error),
    Db(rusqlite::Error),
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Db(error) => write!(f, "db error: {error}"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<rusqlite::Error> for HistoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS launch_history (
    result_id TEXT PRIMARY KEY,
    launch_count INTEGER NOT NULL DEFAULT 0,
    last_launched_epoch_secs INTEGER NOT NULL DEFAULT 0
)";

pub fn open_memory() -> Result<Connection, HistoryError> {
    let conn = Connection::open_in_memory()?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn open_from_config(config: &Config) -> Result<Connection, HistoryError> {
    if let Some(parent) = config.history_db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(&config.history_db_path)?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

/// Records one launch of `result_id`. Visible to the next turn's weight
/// snapshot, not necessarily the current one.
pub fn record_launch(db: &Connection, result_id: &str) -> Result<(), HistoryError> {
    db.execute(
        "INSERT INTO launch_history (result_id, launch_count, last_launched_epoch_secs)
         VALUES (?1, 1, ?2)
         ON CONFLICT(result_id) DO UPDATE SET
             launch_count = launch_count + 1,
             last_launched_epoch_secs = excluded.last_launched_epoch_secs",
        params![result_id, now_epoch_secs()],
    )?;
    Ok(())
}

/// Forgets one item. Returns whether a row existed.
pub fn forget(db: &Connection, result_id: &str) -> Result<bool, HistoryError> {
    let affected = db.execute(
        "DELETE FROM launch_history WHERE result_id = ?1",
        params![result_id],
    )?;
    Ok(affected > 0)
}

/// Read-only snapshot of usage weights, taken once at turn start.
pub fn weights(db: &Connection) -> Result<HashMap<String, u32>, HistoryError> {
    let mut stmt = db.prepare("SELECT result_id, launch_count FROM launch_history")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut snapshot = HashMap::new();
    for row in rows {
        let (result_id, count) = row?;
        snapshot.insert(result_id, count.clamp(0, u32::MAX as i64) as u32);
    }
    Ok(snapshot)
}

/// Most recently launched ids, newest first; feeds the empty-query browse
/// view.
pub fn recent(db: &Connection, limit: usize) -> Result<Vec<String>, HistoryError> {
    let mut stmt = db.prepare(
        "SELECT result_id FROM launch_history
         ORDER BY last_launched_epoch_secs DESC, result_id ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{forget, open_memory, recent, record_launch, weights};

    #[test]
    fn launches_accumulate_per_item() {
        let db = open_memory().expect("db should open");
        record_launch(&db, "app-camera").expect("record should succeed");
        record_launch(&db, "app-camera").expect("record should succeed");
        record_launch(&db, "contact-ada").expect("record should succeed");

        let snapshot = weights(&db).expect("weights should load");
        assert_eq!(snapshot.get("app-camera"), Some(&2));
        assert_eq!(snapshot.get("contact-ada"), Some(&1));
        assert_eq!(snapshot.get("app-unknown"), None);
    }

    #[test]
    fn forget_removes_the_row() {
        let db = open_memory().expect("db should open");
        record_launch(&db, "app-camera").expect("record should succeed");

        assert!(forget(&db, "app-camera").expect("forget should succeed"));
        assert!(!forget(&db, "app-camera").expect("second forget is a no-op"));
        assert!(weights(&db).expect("weights should load").is_empty());
    }

    #[test]
    fn recent_is_bounded_and_deterministic() {
        let db = open_memory().expect("db should open");
        for id in ["a", "b", "c"] {
            record_launch(&db, id).expect("record should succeed");
        }

        let ids = recent(&db, 2).expect("recent should load");
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| ["a", "b", "c"].contains(&id.as_str())));
    }
}
