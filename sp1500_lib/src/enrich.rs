//! Bounded-concurrency orchestration of snapshot jobs.
//!
//! Uses the Semaphore + JoinSet + mpsc pattern: one task per symbol, a
//! semaphore capping in-flight jobs, and a channel delivering finished rows
//! to the collector in completion order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::snapshot::{run_snapshot_job, BarSource, SnapshotRow};

pub const DEFAULT_WORKERS: usize = 20;

/// Run one snapshot job per symbol with at most `workers` in flight and wait
/// for all of them.
///
/// The returned map has exactly one row per distinct input symbol. A task
/// that dies without reporting still gets a row, marked with an error.
/// `on_done` is called once per finished row, in completion order.
pub async fn run_snapshot_jobs<S, P>(
    source: Arc<S>,
    symbols: &[String],
    reference: NaiveDate,
    workers: usize,
    mut on_done: P,
) -> HashMap<String, SnapshotRow>
where
    S: BarSource + 'static,
    P: FnMut(&SnapshotRow),
{
    let workers = workers.max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    let (tx, mut rx) = mpsc::channel::<SnapshotRow>(workers * 2);
    let mut join_set = JoinSet::new();

    for symbol in symbols {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let source = Arc::clone(&source);
        let symbol = symbol.clone();

        join_set.spawn(async move {
            let _permit = sem.acquire().await;
            let row = run_snapshot_job(source.as_ref(), &symbol, reference).await;
            let _ = sender.send(row).await;
        });
    }
    drop(tx);

    let mut results = HashMap::with_capacity(symbols.len());
    while let Some(row) = rx.recv().await {
        on_done(&row);
        results.insert(row.symbol.clone(), row);
    }

    while let Some(joined) = join_set.join_next().await {
        if let Err(err) = joined {
            tracing::error!("snapshot task did not complete: {}", err);
        }
    }

    for symbol in symbols {
        if !results.contains_key(symbol) {
            let row = SnapshotRow::failed(symbol, "snapshot task did not complete");
            on_done(&row);
            results.insert(symbol.clone(), row);
        }
    }

    results
}
