pub mod adapter;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod effects;
pub mod fuzzy;
pub mod history;
pub mod logging;
pub mod model;
pub mod normalizer;
pub mod provider;
pub mod runtime;
pub mod searcher;
pub mod transport;
