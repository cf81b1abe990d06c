pub mod config;
pub mod error;
pub mod store;
pub mod copier;
pub mod expiry;
pub mod scheduler;
pub mod dashboard;
pub mod utils;
pub mod system_snapshot;

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::copier::SnapshotCopier;
use crate::expiry::ExpirySweeper;
use crate::store::DocumentStore;
use crate::system_snapshot::{CollectionSize, CollectionsSnapshot, SystemSnapshot};
use crate::utils::{current_time_ms, ms_to_rfc3339};

// ========================================
// ENGINE (The Singleton)
// ========================================

/// Holds the store client and the jobs built on it.
/// Cheap to clone (all fields are Arcs).
#[derive(Clone)]
pub struct RidesEngine {
    pub store: Arc<dyn DocumentStore>,
    pub copier: Arc<SnapshotCopier>,
    pub sweeper: Option<Arc<ExpirySweeper>>,
    pub sweep_interval: std::time::Duration,
    pub start_time: Instant,
}

impl RidesEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let copier = Arc::new(SnapshotCopier::new(Arc::clone(&store), config.copier.clone()));
        let sweeper = config
            .expiry
            .sweep_enabled
            .then(|| Arc::new(ExpirySweeper::for_copier(Arc::clone(&store), &config.copier)));

        Self {
            store,
            copier,
            sweeper,
            sweep_interval: config.expiry.sweep_interval(),
            start_time: Instant::now(),
        }
    }

    /// Spawns the copier timer and, when enabled, the expiry sweep timer.
    pub fn spawn_jobs(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = vec![tokio::spawn(scheduler::run_copier(
            Arc::clone(&self.copier),
            self.copier.config().interval(),
            shutdown.clone(),
        ))];

        if let Some(sweeper) = &self.sweeper {
            handles.push(tokio::spawn(scheduler::run_sweeper(
                Arc::clone(sweeper),
                self.sweep_interval,
                shutdown,
            )));
        }
        handles
    }

    pub async fn get_snapshot(&self) -> SystemSnapshot {
        let config = self.copier.config();
        let source = config.source_collection.clone();
        let recent = config.recent_collection.clone();

        let store = Arc::clone(&self.store);
        let (source_count, recent_count) = {
            let (source, recent) = (source.clone(), recent.clone());
            tokio::task::spawn_blocking(move || {
                (store.count(&source).ok(), store.count(&recent).ok())
            })
            .await
            .unwrap_or((None, None))
        };

        SystemSnapshot {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            server_time: ms_to_rfc3339(current_time_ms()),
            copier: self.copier.get_snapshot(),
            sweeper: self.sweeper.as_ref().map(|s| s.get_snapshot()),
            collections: CollectionsSnapshot {
                source: CollectionSize { name: source, documents: source_count },
                recent: CollectionSize { name: recent, documents: recent_count },
            },
        }
    }
}
