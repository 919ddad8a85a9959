// Background maintenance worker: retention sweeps and periodic stats logging.
// Sweeps run on a fixed interval, or on a cron schedule (local time) when configured.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, interval};
use tracing::{debug, info, instrument, warn};

use crate::store::EntityStore;

/// Store, counters and shutdown for the worker.
pub struct WorkerDeps {
    pub store: Arc<EntityStore>,
    pub ws_clients: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Retention and logging config.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Samples older than this are dropped on each sweep.
    pub max_age_secs: u64,
    pub sweep_interval_secs: u64,
    /// Optional cron expression for sweeps (e.g. "0 * * * * *" = every minute). Uses local time.
    pub sweep_schedule: Option<String>,
    /// How often to log store stats at INFO level.
    pub stats_log_interval_secs: u64,
}

/// Runs one retention pass; returns the number of samples removed.
#[instrument(level = "debug", skip(store))]
pub fn run_one_sweep(store: &EntityStore, max_age: TimeDelta, now: DateTime<Utc>) -> usize {
    let cutoff = now
        .checked_sub_signed(max_age)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    store.prune_older_than(cutoff)
}

/// Spawns the worker. Returns a join handle that completes after shutdown.
pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip_all, fields(max_age_secs = config.max_age_secs))]
async fn run(deps: WorkerDeps, config: WorkerConfig) {
    let WorkerDeps {
        store,
        ws_clients,
        mut shutdown_rx,
    } = deps;

    let max_age = i64::try_from(config.max_age_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX);
    let mut stats_log_tick = interval(Duration::from_secs(config.stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (sweep_tx, mut sweep_rx) = mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(sweep_scheduler(config.clone(), sweep_tx));

    let mut swept_total: u64 = 0;

    loop {
        tokio::select! {
            Some(()) = sweep_rx.recv() => {
                let removed = run_one_sweep(&store, max_age, Utc::now());
                swept_total += removed as u64;
                if removed > 0 {
                    info!(removed, operation = "retention_sweep", "Expired samples dropped");
                } else {
                    debug!(operation = "retention_sweep", "Nothing to drop");
                }
            }
            _ = stats_log_tick.tick() => {
                let stats = store.stats();
                info!(
                    servers = stats.entities,
                    samples = stats.samples,
                    samples_swept_total = swept_total,
                    ws_clients = ws_clients.load(Ordering::Relaxed),
                    "app stats"
                );
            }
            _ = &mut shutdown_rx => {
                debug!("Worker shutting down");
                break;
            }
        }
    }
    scheduler.abort();
}

/// Sends a message on `tx` at each sweep time (cron or fixed interval).
async fn sweep_scheduler(config: WorkerConfig, tx: mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.sweep_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid sweep_schedule; retention sweeps will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            if let Some(next) = schedule.after(&now).next() {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let period = Duration::from_secs(config.sweep_interval_secs);
        loop {
            tokio::time::sleep(period).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
