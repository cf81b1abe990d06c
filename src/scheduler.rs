//! Fixed-interval timers driving the copier and the expiry sweeper.
//! Each tick is awaited before the next one is taken, so runs never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::copier::SnapshotCopier;
use crate::expiry::ExpirySweeper;

pub async fn run_copier(copier: Arc<SnapshotCopier>, every: Duration, shutdown: CancellationToken) {
    info!(
        "Copier scheduled every {:?} ('{}' -> '{}')",
        every,
        copier.config().source_collection,
        copier.config().recent_collection
    );

    run_every(every, shutdown, || {
        let copier = Arc::clone(&copier);
        async move {
            // Failures are logged and counted by the copier; the next tick is the retry
            let _ = copier.fire().await;
        }
    })
    .await;

    info!("Copier scheduler stopped");
}

pub async fn run_sweeper(
    sweeper: Arc<ExpirySweeper>,
    every: Duration,
    shutdown: CancellationToken,
) {
    info!("Expiry sweep scheduled every {:?}", every);

    run_every(every, shutdown, || {
        let sweeper = Arc::clone(&sweeper);
        async move {
            let _ = sweeper.sweep().await;
        }
    })
    .await;

    info!("Expiry sweeper stopped");
}

async fn run_every<F, Fut>(every: Duration, shutdown: CancellationToken, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                // Runs to completion even if shutdown fires meanwhile
                job().await;
            }
        }
    }
}
