//! Snapshot Copier: copies recently created ride requests into the recent collection,
//! stamping each copy with an expiry time.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::rides::{RecentRideRequest, RideRequest};
use super::snapshot::{CopierSnapshot, CopierStats};
use crate::config::CopierConfig;
use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore, WriteBatch};
use crate::utils::{current_time_ms, ms_to_rfc3339};

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyReport {
    pub run_id: Uuid,
    pub now: u64,
    pub window_start: u64,
    pub expires_at: u64,
    pub copied: usize,
    pub batches: usize,
}

pub struct SnapshotCopier {
    store: Arc<dyn DocumentStore>,
    config: CopierConfig,
    stats: Mutex<CopierStats>,
}

impl SnapshotCopier {
    pub fn new(store: Arc<dyn DocumentStore>, config: CopierConfig) -> Self {
        Self {
            store,
            config,
            stats: Mutex::new(CopierStats::default()),
        }
    }

    pub fn config(&self) -> &CopierConfig {
        &self.config
    }

    /// Entry point for a timer firing: honours the enabled flag and the run timeout.
    /// `Ok(None)` means copying is disabled and the store was not touched.
    pub async fn fire(&self) -> Result<Option<CopyReport>> {
        if !self.config.enabled {
            self.stats.lock().skipped += 1;
            info!("Recent ride request copy is disabled, skipping run");
            return Ok(None);
        }

        let timeout = self.config.run_timeout();
        match tokio::time::timeout(timeout, self.run_once()).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                let err = Error::Timeout(timeout);
                self.record_failure(current_time_ms(), &err);
                Err(err)
            }
        }
    }

    pub async fn run_once(&self) -> Result<CopyReport> {
        self.run_at(current_time_ms()).await
    }

    /// Runs one copy pass as if the clock read `now` (epoch ms).
    pub async fn run_at(&self, now: u64) -> Result<CopyReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("copy_run", %run_id);
        let result = self.copy(run_id, now).instrument(span).await;

        match &result {
            Ok(report) => self.record_success(report),
            Err(e) => self.record_failure(now, e),
        }
        result
    }

    async fn copy(&self, run_id: Uuid, now: u64) -> Result<CopyReport> {
        let window_start = now.saturating_sub(self.config.lookback_ms());
        let expires_at = now.saturating_add(self.config.retention_ms());

        let store = Arc::clone(&self.store);
        let source = self.config.source_collection.clone();
        let created_field = self.config.created_at_field.clone();
        let rides = tokio::task::spawn_blocking(move || {
            store.query_since(&source, &created_field, window_start)
        })
        .await??;

        let matched = rides.len();
        let expires_field = self.config.expires_at_field.as_str();
        let mut copies = rides.into_iter().map(|doc| {
            RecentRideRequest::from_ride(RideRequest::from_document(doc), expires_at)
                .into_document(expires_field)
        });

        let mut copied = 0;
        let mut batches = 0;
        loop {
            let batch = self.next_batch(&mut copies);
            if batch.is_empty() {
                break;
            }
            let size = batch.len();

            let store = Arc::clone(&self.store);
            let committed = tokio::task::spawn_blocking(move || store.commit(batch)).await;
            if let Err(e) = committed.map_err(Error::from).and_then(|r| r) {
                if copied > 0 {
                    warn!(
                        "Batch {} failed after {} of {} copies were committed",
                        batches + 1, copied, matched
                    );
                }
                return Err(e);
            }

            copied += size;
            batches += 1;
        }

        info!(
            "Copied {} ride requests into '{}' in {} batches (window from {}, expires {})",
            copied,
            self.config.recent_collection,
            batches,
            ms_to_rfc3339(window_start),
            ms_to_rfc3339(expires_at)
        );

        Ok(CopyReport { run_id, now, window_start, expires_at, copied, batches })
    }

    fn next_batch(&self, copies: &mut impl Iterator<Item = Document>) -> WriteBatch {
        let mut batch = WriteBatch::with_capacity(self.config.batch_size);
        for doc in copies.take(self.config.batch_size) {
            batch.set(&self.config.recent_collection, doc);
        }
        batch
    }

    fn record_success(&self, report: &CopyReport) {
        let mut stats = self.stats.lock();
        stats.runs += 1;
        stats.total_copied += report.copied as u64;
        stats.last_run_at = Some(report.now);
        stats.last_copied = Some(report.copied);
        stats.last_error = None;
    }

    fn record_failure(&self, now: u64, err: &Error) {
        error!("Recent ride request copy failed: {}", err);
        let mut stats = self.stats.lock();
        stats.runs += 1;
        stats.failures += 1;
        stats.last_run_at = Some(now);
        stats.last_copied = None;
        stats.last_error = Some(err.to_string());
    }

    pub fn get_snapshot(&self) -> CopierSnapshot {
        let stats = self.stats.lock().clone();
        CopierSnapshot {
            enabled: self.config.enabled,
            source_collection: self.config.source_collection.clone(),
            recent_collection: self.config.recent_collection.clone(),
            interval_secs: self.config.interval_secs,
            lookback_secs: self.config.lookback_secs,
            retention_secs: self.config.retention_secs,
            runs: stats.runs,
            failures: stats.failures,
            skipped: stats.skipped,
            total_copied: stats.total_copied,
            last_run_at: stats.last_run_at.map(ms_to_rfc3339),
            last_copied: stats.last_copied,
            last_error: stats.last_error,
        }
    }
}
