/*!
 * Background re-export of changed domains.
 *
 * Mutations enqueue the name of the domain they touched; a single worker task
 * exports queued domains one at a time on the blocking thread pool. The
 * channel is bounded and `enqueue` waits for a free slot when it is full.
 * Export failures are logged and otherwise dropped.
 */

use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::database::DataStore;
use crate::errors::{Result, StoreError};
use crate::pipeline;

/// Default number of pending exports
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded queue of domains waiting to be exported
pub struct ExportQueue {
    sender: mpsc::Sender<String>,
    worker: JoinHandle<usize>,
}

impl ExportQueue {
    /// Start the worker task. Must be called from within a tokio runtime.
    pub fn start(
        store: Arc<DataStore>,
        export_dir: PathBuf,
        source_language: String,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(store, export_dir, source_language, receiver));
        Self { sender, worker }
    }

    /// Queue a domain for export, waiting while the queue is full
    pub async fn enqueue(&self, domain: impl Into<String>) -> Result<()> {
        let domain = domain.into();
        debug!("Queueing export of domain '{}'", domain);
        self.sender
            .send(domain)
            .await
            .map_err(|e| StoreError::Storage(format!("export queue closed, dropped '{}'", e.0)))
    }

    /// Stop accepting work, finish the queued exports and return how many
    /// of them succeeded
    pub async fn shutdown(self) -> usize {
        drop(self.sender);
        match self.worker.await {
            Ok(exported) => exported,
            Err(e) => {
                error!("Export worker stopped abnormally: {}", e);
                0
            }
        }
    }
}

async fn run_worker(
    store: Arc<DataStore>,
    export_dir: PathBuf,
    source_language: String,
    mut receiver: mpsc::Receiver<String>,
) -> usize {
    let mut exported = 0;

    while let Some(domain) = receiver.recv().await {
        let store = Arc::clone(&store);
        let dir = export_dir.clone();
        let language = source_language.clone();
        let name = domain.clone();

        let result = tokio::task::spawn_blocking(move || {
            pipeline::export_directory(&store, Some(name.as_str()), &dir, &language)
        })
        .await;

        match result {
            Ok(Ok(paths)) => {
                exported += 1;
                info!("Re-exported domain '{}' ({} file(s))", domain, paths.len());
            }
            Ok(Err(e)) => error!("Failed to export domain '{}': {}", domain, e),
            Err(e) => error!("Export of domain '{}' panicked: {}", domain, e),
        }
    }

    debug!("Export queue drained");
    exported
}
