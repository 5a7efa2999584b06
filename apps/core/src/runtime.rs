use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, ConfigError};
use crate::core_service::{CoreService, ServiceError};
use crate::effects::FilesystemEffects;
use crate::history;
use crate::logging;
use crate::model::{HistoryEntry, ScoredResult};
use crate::provider::{
    AppProvider, ContactProvider, HistoryProvider, PhoneDialerProvider, Provider,
    SettingsProvider, ShortcutProvider, SuggestionProvider,
};
use crate::searcher::SearchRequest;

#[derive(Debug)]
pub enum RuntimeError {
    Args(String),
    Config(ConfigError),
    Service(ServiceError),
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Args(error) => write!(f, "argument error: {error}"),
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub query: Option<String>,
    pub browse_all: bool,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--query requires text".to_string())?;
                options.query = Some(value.clone());
            }
            "--browse" => {
                options.browse_all = true;
            }
            other => {
                return Err(format!(
                    "unknown argument '{other}'; usage: kestrel-core [--config PATH] [--query TEXT] [--browse]"
                ));
            }
        }
    }

    Ok(options)
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    if let Err(error) = logging::init() {
        eprintln!("[kestrel-core] file logging unavailable: {error}");
    }

    let config = config::load(options.config_path.as_deref())?;
    if !config.config_path.exists() {
        config::save(&config)?;
        println!(
            "[kestrel-core] wrote default config to {}",
            config.config_path.display()
        );
    }
    println!(
        "[kestrel-core] startup max_results={} history_db_path={} config_path={}",
        config.max_results,
        config.history_db_path.display(),
        config.config_path.display(),
    );

    let db = history::open_from_config(&config).map_err(ServiceError::from)?;
    let providers = runtime_providers(&config, &db).map_err(ServiceError::from)?;
    println!("[kestrel-core] registered providers={}", providers.len());

    let service =
        CoreService::with_connection(config, db, providers, Arc::new(FilesystemEffects))?;

    match options.query {
        Some(query) => {
            let request = if options.browse_all {
                SearchRequest::browse()
            } else {
                SearchRequest::filter(&query)
            };
            let rows = service.search_blocking(&request)?;
            print_results(&rows);
            Ok(())
        }
        None => run_query_loop(&service),
    }
}

/// Fixture-backed composition root: real hosts register providers wired to
/// the platform's package manager, contacts database, and settings registry.
fn runtime_providers(
    config: &crate::config::Config,
    db: &rusqlite::Connection,
) -> Result<Vec<Arc<dyn Provider>>, history::HistoryError> {
    let apps = AppProvider::deterministic_fixture();
    let names = fixture_names();

    let recent = history::recent(db, 10)?;
    let history_entries: Vec<HistoryEntry> = recent
        .iter()
        .filter_map(|id| {
            names
                .get(id.as_str())
                .map(|name| HistoryEntry::new(id, name))
        })
        .collect();

    Ok(vec![
        Arc::new(apps),
        Arc::new(ShortcutProvider::deterministic_fixture()),
        Arc::new(ContactProvider::deterministic_fixture()),
        Arc::new(HistoryProvider::from_entries(history_entries)),
        Arc::new(SettingsProvider::deterministic_fixture()),
        Arc::new(PhoneDialerProvider),
        Arc::new(SuggestionProvider::new(&config.search_engine_url)),
    ])
}

fn fixture_names() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("app-camera", "Camera"),
        ("app-calc", "Calculator"),
        ("app-code", "Visual Studio Code"),
        ("app-term", "Terminal"),
        ("shortcut-compose", "Compose mail"),
    ])
}

fn run_query_loop(service: &CoreService) -> Result<(), RuntimeError> {
    println!("[kestrel-core] interactive mode: type a query, empty line browses all, 'quit' exits");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        let request = if trimmed.is_empty() {
            SearchRequest::browse()
        } else {
            SearchRequest::filter(trimmed)
        };
        let rows = service.search_blocking(&request)?;
        print_results(&rows);
    }

    Ok(())
}

fn print_results(rows: &[ScoredResult]) {
    if rows.is_empty() {
        println!("  no matches");
        return;
    }
    for (index, row) in rows.iter().enumerate() {
        println!(
            "  {:2}. [{}] {} (score {})",
            index + 1,
            row.entry.kind().as_str(),
            row.entry.title(),
            row.composite_score(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_args, RuntimeOptions};
    use std::path::PathBuf;

    #[test]
    fn parses_config_query_and_browse_flags() {
        let args = vec![
            "--config".to_string(),
            "/tmp/kestrel.toml".to_string(),
            "--query".to_string(),
            "camera".to_string(),
            "--browse".to_string(),
        ];
        let options = parse_cli_args(&args).expect("args should parse");
        assert_eq!(
            options,
            RuntimeOptions {
                config_path: Some(PathBuf::from("/tmp/kestrel.toml")),
                query: Some("camera".to_string()),
                browse_all: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_arguments() {
        let error = parse_cli_args(&["--overlay".to_string()]).expect_err("should fail");
        assert!(error.contains("unknown argument"));
    }

    #[test]
    fn missing_flag_values_are_errors() {
        assert!(parse_cli_args(&["--config".to_string()]).is_err());
        assert!(parse_cli_args(&["--query".to_string()]).is_err());
    }
}
