//! Expiry Sweeper: TTL deletion for the recent collection.
//! Removes copies whose expiry stamp has passed.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::CopierConfig;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::utils::{current_time_ms, ms_to_rfc3339};

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SweeperSnapshot {
    pub sweeps: u64,
    pub failures: u64,
    pub total_removed: u64,
    pub last_sweep_at: Option<String>, // ISO8601
    pub last_removed: Option<usize>,
}

#[derive(Default)]
struct SweepStats {
    sweeps: u64,
    failures: u64,
    total_removed: u64,
    last_sweep_at: Option<u64>,
    last_removed: Option<usize>,
}

pub struct ExpirySweeper {
    store: Arc<dyn DocumentStore>,
    collection: String,
    expires_at_field: String,
    stats: Mutex<SweepStats>,
}

impl ExpirySweeper {
    /// Sweeps the copier's destination collection using its expiry field.
    pub fn for_copier(store: Arc<dyn DocumentStore>, config: &CopierConfig) -> Self {
        Self {
            store,
            collection: config.recent_collection.clone(),
            expires_at_field: config.expires_at_field.clone(),
            stats: Mutex::new(SweepStats::default()),
        }
    }

    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(current_time_ms()).await
    }

    pub async fn sweep_at(&self, now: u64) -> Result<usize> {
        let store = Arc::clone(&self.store);
        let collection = self.collection.clone();
        let field = self.expires_at_field.clone();
        let result = tokio::task::spawn_blocking(move || {
            store.delete_expired(&collection, &field, now)
        })
        .await
        .map_err(Error::from)
        .and_then(|r| r);

        let mut stats = self.stats.lock();
        stats.sweeps += 1;
        stats.last_sweep_at = Some(now);
        match &result {
            Ok(removed) => {
                stats.total_removed += *removed as u64;
                stats.last_removed = Some(*removed);
                if *removed > 0 {
                    info!("Removed {} expired documents from '{}'", removed, self.collection);
                } else {
                    debug!("No expired documents in '{}'", self.collection);
                }
            }
            Err(e) => {
                stats.failures += 1;
                stats.last_removed = None;
                error!("Expiry sweep on '{}' failed: {}", self.collection, e);
            }
        }
        result
    }

    pub fn get_snapshot(&self) -> SweeperSnapshot {
        let stats = self.stats.lock();
        SweeperSnapshot {
            sweeps: stats.sweeps,
            failures: stats.failures,
            total_removed: stats.total_removed,
            last_sweep_at: stats.last_sweep_at.map(ms_to_rfc3339),
            last_removed: stats.last_removed,
        }
    }
}
