//! # GiveHub API
//!
//! REST server for the GiveHub donation/marketplace system.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Flow                                   │
//! │                                                                         │
//! │  HTTP request                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Identity extractor (auth.rs)                                          │
//! │   resolves the bearer token ONCE into Option<Identity>                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Handler (routes/*) ──► Service (services/*)                           │
//! │   parses params          authorize (givehub-core)                      │
//! │                          transition legality (givehub-core)            │
//! │                          repository writes (givehub-db)                │
//! │                          best-effort notification dispatch             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  JSON response (or taxonomy error, error.rs)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use auth::JwtManager;
use config::ApiConfig;
use givehub_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    /// Creates the shared state from a connected database and configuration.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState { db, jwt, config }
    }
}
