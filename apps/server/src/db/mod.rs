//! Database layer - storage traits and backends

pub mod memory;
pub mod metrics;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use metrics::MetricsRepository;
pub use postgres::{connect_pool, run_migrations, PostgresStore, PostgresTransactionContext};
pub use traits::{Store, StoreTransaction, TxMode};
