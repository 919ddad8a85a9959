// In-memory store: server name -> sample history.
// DashMap shards the name index; each history has its own RwLock so appends to
// different servers never contend and queries read a consistent snapshot.

pub mod aggregation;
mod history;

pub use history::SampleHistory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::instrument;

use crate::error::{CoreError, Result};
use crate::models::{EntityAverages, EntitySummary, Sample, StoreStats, WindowSpec};

type HistoryHandle = Arc<RwLock<SampleHistory>>;

/// Read-only view of one server's history, as returned by [`EntityStore::lookup`].
/// Appends and retention only go through the store.
///
/// ```compile_fail
/// use serverload::store::EntityStore;
///
/// let store = EntityStore::new();
/// store.record_sample("web-01", 1.0, 1.0, chrono::Utc::now()).unwrap();
/// let history = store.lookup("web-01").unwrap();
/// history.write();
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRef(HistoryHandle);

impl HistoryRef {
    /// Shared lock on the history; appends wait until the guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, SampleHistory> {
        self.0.read()
    }
}

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: DashMap<String, HistoryHandle>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sample` to the history of `entity`, creating the history on first use.
    pub fn upsert(&self, entity: &str, sample: Sample) -> Result<()> {
        if entity.is_empty() {
            return Err(CoreError::InvalidInput(
                "server name must be non-empty".into(),
            ));
        }
        let history = self.history_or_insert(entity);
        history.write().push(sample);
        Ok(())
    }

    /// Returns the history for `entity`, or `None` if it was never recorded.
    pub fn lookup(&self, entity: &str) -> Option<HistoryRef> {
        self.entities
            .get(entity)
            .map(|h| HistoryRef(Arc::clone(h.value())))
    }

    fn history_or_insert(&self, entity: &str) -> HistoryHandle {
        // Fast path only takes the shard read lock.
        if let Some(h) = self.entities.get(entity) {
            return Arc::clone(h.value());
        }
        Arc::clone(self.entities.entry(entity.to_owned()).or_default().value())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn record_sample(
        &self,
        entity: &str,
        cpu: f64,
        mem: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.upsert(entity, Sample::new(cpu, mem, timestamp))
    }

    /// Averages for each window, ending at the current time.
    pub fn query_averages(&self, entity: &str, windows: &[WindowSpec]) -> Result<EntityAverages> {
        self.query_averages_at(entity, windows, Utc::now())
    }

    #[instrument(level = "debug", skip(self, windows), fields(windows = windows.len()))]
    pub fn query_averages_at(
        &self,
        entity: &str,
        windows: &[WindowSpec],
        now: DateTime<Utc>,
    ) -> Result<EntityAverages> {
        let handle = self.lookup(entity).ok_or_else(|| CoreError::NotFound {
            entity: entity.to_owned(),
        })?;
        let history = handle.read();
        Ok(EntityAverages {
            entity: entity.to_owned(),
            samples: history.len(),
            windows: windows.iter().map(|w| history.averages(now, w)).collect(),
        })
    }

    /// Drops every sample older than `cutoff` across all servers. Servers stay known
    /// even when their history becomes empty. Returns the number of samples removed.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        self.handles()
            .iter()
            .map(|h| h.write().retain_since(cutoff))
            .sum()
    }

    pub fn stats(&self) -> StoreStats {
        let handles = self.handles();
        StoreStats {
            entities: handles.len(),
            samples: handles.iter().map(|h| h.read().len()).sum(),
        }
    }

    /// Known servers sorted by name.
    pub fn entities(&self) -> Vec<EntitySummary> {
        let mut out: Vec<EntitySummary> = self
            .entities
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(name, handle)| {
                let history = handle.read();
                EntitySummary {
                    name,
                    samples: history.len(),
                    latest: history.latest().map(|s| s.timestamp),
                }
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // Handles are cloned out first so no shard lock is held while a history is locked.
    fn handles(&self) -> Vec<HistoryHandle> {
        self.entities.iter().map(|e| Arc::clone(e.value())).collect()
    }
}
