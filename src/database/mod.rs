/*!
 * Database module for persistent storage of translations.
 *
 * This module provides:
 * - A connection seam over SQLite (rusqlite) and PostgreSQL (postgres)
 * - Per-back-end query adapters with their migration scripts
 * - The schema migration engine
 * - The `DataStore` with its id caches and operation statistics
 */

pub mod adapter;
pub mod connection;
pub mod postgres_adapter;
pub mod schema;
pub mod sqlite_adapter;
pub mod stats;
pub mod store;

// Re-export main types
pub use adapter::{adapter_for, adapter_for_name, QueryAdapter};
pub use connection::{PostgresConnection, SqlConnection, SqliteConnection};
pub use stats::Stats;
pub use store::DataStore;
