use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::database::DataStore;
use crate::errors::{ImportFailure, MigrationFailure, StoreError};
use crate::export_queue::ExportQueue;
use crate::model::{Domain, Language, SearchField, SearchHit};
use crate::pipeline;

// @module: Application context shared by the CLI and an API layer

/// Owns the data store, the export queue and the configuration.
///
/// Data operations return `StoreError` so that an API layer can map them to
/// status codes with `StoreError::http_status`. Mutations queue a re-export
/// of the domain they touched. Store calls are blocking.
pub struct Controller {
    // @field: App configuration
    config: Config,
    store: Arc<DataStore>,
    exports: ExportQueue,
}

impl Controller {
    // @method: Connect to the configured database and start the export worker.
    // Must be called from within a tokio runtime.
    pub fn with_config(config: Config) -> Result<Self> {
        let store = DataStore::open(&config.database).with_context(|| {
            format!(
                "Failed to open {} database",
                config.database.driver.as_str()
            )
        })?;

        Ok(Self::with_store(config, store))
    }

    /// Build a controller around an existing data store
    pub fn with_store(config: Config, store: DataStore) -> Self {
        let store = Arc::new(store);
        let exports = ExportQueue::start(
            Arc::clone(&store),
            PathBuf::from(&config.xliff.export_path),
            config.xliff.source_language.clone(),
            config.export.queue_capacity,
        );

        Self {
            config,
            store,
            exports,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Create or upgrade every table
    pub fn init_db(&self) -> std::result::Result<i64, MigrationFailure> {
        self.store.migrate_up()
    }

    /// Drop every table created by `init_db`
    pub fn remove_db(&self) -> std::result::Result<i64, MigrationFailure> {
        self.store.migrate_down()
    }

    // =========================================================================
    // Import / export
    // =========================================================================

    /// Import a directory, defaulting to the configured import path
    pub fn import<F: FnMut(&str)>(
        &self,
        dir: Option<&Path>,
        notify: F,
    ) -> std::result::Result<usize, ImportFailure> {
        let dir = dir.unwrap_or_else(|| Path::new(&self.config.xliff.import_path));
        pipeline::import_directory(&self.store, dir, notify)
    }

    /// Export one or all domains, defaulting to the configured export path
    pub fn export(
        &self,
        domain: Option<&str>,
        dir: Option<&Path>,
    ) -> crate::errors::Result<Vec<PathBuf>> {
        let dir = dir.unwrap_or_else(|| Path::new(&self.config.xliff.export_path));
        pipeline::export_directory(&self.store, domain, dir, &self.config.xliff.source_language)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn languages(&self) -> crate::errors::Result<Vec<Language>> {
        self.store.get_language_list()
    }

    pub fn domains(&self) -> crate::errors::Result<Vec<Domain>> {
        self.store.get_domain_list()
    }

    pub fn domain(&self, name: &str) -> crate::errors::Result<Domain> {
        self.store.get_full_domain(name)
    }

    pub fn search(&self, term: &str, field: SearchField) -> crate::errors::Result<Vec<SearchHit>> {
        self.store.search(term, field)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn add_language(&self, code: &str, name: &str) -> crate::errors::Result<i64> {
        self.store.create_language(code, name)
    }

    /// Set a translation and queue the domain for re-export
    pub async fn set_translation(
        &self,
        domain: &str,
        string: &str,
        language: &str,
        content: &str,
        allow_create: bool,
    ) -> crate::errors::Result<()> {
        let (name, string, language, content) = (
            domain.to_string(),
            string.to_string(),
            language.to_string(),
            content.to_string(),
        );
        self.blocking(move |store| {
            store.create_or_update_translation(&name, &string, &language, &content, allow_create)
        })
        .await?;
        self.exports.enqueue(domain).await
    }

    /// Delete a string and queue the domain for re-export
    pub async fn delete_string(&self, domain: &str, string: &str) -> crate::errors::Result<()> {
        let (name, string) = (domain.to_string(), string.to_string());
        self.blocking(move |store| store.delete_string(&name, &string))
            .await?;
        self.exports.enqueue(domain).await
    }

    /// Delete a translation and queue the domain for re-export
    pub async fn delete_translation(
        &self,
        domain: &str,
        string: &str,
        language: &str,
    ) -> crate::errors::Result<()> {
        let (name, string, language) = (domain.to_string(), string.to_string(), language.to_string());
        self.blocking(move |store| store.delete_translation(&name, &string, &language))
            .await?;
        self.exports.enqueue(domain).await
    }

    // @runs: A store operation on the blocking pool. The PostgreSQL client
    // must not be driven from an async worker thread.
    async fn blocking<T, F>(&self, operation: F) -> crate::errors::Result<T>
    where
        F: FnOnce(&DataStore) -> crate::errors::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || operation(&store))
            .await
            .map_err(|e| StoreError::Storage(format!("store task failed: {}", e)))?
    }

    /// Drain the export queue; returns the statistics report of the store
    pub async fn shutdown(self) -> String {
        let exported = self.exports.shutdown().await;
        if exported > 0 {
            info!("Completed {} queued export(s)", exported);
        } else {
            debug!("No queued exports");
        }
        let report = self.store.stats().to_string();

        // Closing a PostgreSQL connection blocks
        let store = self.store;
        if let Err(e) = tokio::task::spawn_blocking(move || drop(store)).await {
            debug!("Closing the data store failed: {}", e);
        }
        report
    }
}
