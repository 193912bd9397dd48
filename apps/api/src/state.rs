use std::sync::Arc;

use crate::assembler::AssemblyConfig;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::revision::{CommandInterpreter, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-only after startup.
    pub catalog: Arc<Catalog>,
    /// Beam width and plan depth for every search.
    pub assembly: AssemblyConfig,
    pub interpreter: &'static CommandInterpreter,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: &Config, catalog: Catalog) -> Self {
        let assembly = AssemblyConfig {
            beam_width: config.beam_width,
            max_depth: config.max_depth,
            ..AssemblyConfig::default()
        };
        AppState {
            sessions: SessionStore::new(config.history_cap),
            catalog: Arc::new(catalog),
            assembly,
            interpreter: CommandInterpreter::standard(),
        }
    }
}
