//! Application State
//!
//! Holds the resources shared across all handlers: the loaded catalog, the
//! card/strategy stores, and the `StrategyService` that sits on top of them.
//! Constructed once in `main` and threaded through as dependency-injected
//! state, rather than reached for as a module-level singleton.

use std::sync::Arc;

use compiler_core::catalog::Catalog;
use compiler_core::store::memory::{InMemoryCardStore, InMemoryStrategyStore};
use compiler_core::store::postgres::{PostgresCardStore, PostgresStrategyStore};
use compiler_core::store::{CardStore, StrategyStore};
use compiler_core::StrategyService;
use sea_orm::Database;

use crate::config::AppConfig;

/// Application state shared across all handlers
pub struct AppState {
    pub config: AppConfig,
    pub service: Arc<StrategyService>,
    pub has_db: bool,
}

impl AppState {
    /// Create new state backed by Postgres, loading the catalog from disk.
    pub async fn new(app_config: AppConfig) -> Result<Self, String> {
        let catalog = Arc::new(
            Catalog::load_from_dir(&app_config.catalog_dir()).map_err(|e| e.to_string())?,
        );
        tracing::info!("catalog loaded from {}", app_config.catalog_dir());

        let db = Database::connect(app_config.database.effective_url())
            .await
            .map_err(|e| e.to_string())?;
        tracing::info!("connected to strategy store database");

        let cards: Arc<dyn CardStore> = Arc::new(PostgresCardStore::new(db.clone()));
        let strategies: Arc<dyn StrategyStore> = Arc::new(PostgresStrategyStore::new(db));

        let service = Arc::new(StrategyService::new(catalog, cards, strategies));

        Ok(Self {
            config: app_config,
            service,
            has_db: true,
        })
    }

    /// Create state without a database connection, backed by the in-memory
    /// stores (used for local development and tests), mirroring the
    /// teacher's "run without persistence" fallback.
    pub fn without_db(catalog_dir: &str) -> Self {
        tracing::info!("running without database, using in-memory card/strategy stores");

        let catalog = Arc::new(
            Catalog::load_from_dir(catalog_dir).expect("failed to load archetype catalog"),
        );
        let cards: Arc<dyn CardStore> = Arc::new(InMemoryCardStore::default());
        let strategies: Arc<dyn StrategyStore> = Arc::new(InMemoryStrategyStore::default());
        let service = Arc::new(StrategyService::new(catalog, cards, strategies));

        Self {
            config: AppConfig {
                database: crate::config::DatabaseConfig {
                    url: String::new(),
                    emulator_url: None,
                },
                server: crate::config::ServerConfig {
                    port: 8080,
                    catalog_dir: Some(catalog_dir.to_string()),
                },
                auth: crate::config::AuthConfig { token: None },
            },
            service,
            has_db: false,
        }
    }
}
