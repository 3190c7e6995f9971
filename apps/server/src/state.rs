//! Shared application state

use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::db::{self, MemoryStore, MetricsRepository, PostgresStore, Store};
use crate::services::{
    AdmissionService, FacilityService, MetricsService, NoteService, OccupancyService, StayService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    /// Present only on the PostgreSQL backend.
    pub db_pool: Option<PgPool>,
    pub facility: FacilityService,
    pub admissions: AdmissionService,
    pub stays: StayService,
    pub notes: NoteService,
    pub occupancy: OccupancyService,
    pub metrics_service: MetricsService,
}

impl AppState {
    /// Connect the configured backend and wire up the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (store, db_pool): (Arc<dyn Store>, Option<PgPool>) = match config.database.backend {
            StoreBackend::Postgres => {
                let pool = db::connect_pool(&config.database)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                if config.database.run_migrations {
                    db::run_migrations(&pool)
                        .await
                        .context("Failed to run database migrations")?;
                    tracing::info!("Database migrations applied");
                }
                let store = PostgresStore::new(pool.clone(), config.database.lock_timeout_seconds);
                (Arc::new(store), Some(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                (Arc::new(MemoryStore::new()), None)
            }
        };

        Ok(Self::with_store(config, store, db_pool))
    }

    /// State over the in-memory backend, for tests and demos.
    pub fn in_memory() -> Self {
        Self::with_store(Config::in_memory(), Arc::new(MemoryStore::new()), None)
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>, db_pool: Option<PgPool>) -> Self {
        let metrics_repo = MetricsRepository::new(store.clone(), db_pool.clone());
        Self {
            config: Arc::new(config),
            facility: FacilityService::new(store.clone()),
            admissions: AdmissionService::new(store.clone()),
            stays: StayService::new(store.clone()),
            notes: NoteService::new(store.clone()),
            occupancy: OccupancyService::new(store.clone()),
            metrics_service: MetricsService::new(metrics_repo),
            store,
            db_pool,
        }
    }
}
