//! Bounded per-category history of recorded snapshots

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::snapshot::{CategoryRecord, MetricCategory, Snapshot};

/// Default number of entries retained per category
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: MetricCategory,
    pub record: CategoryRecord,
}

/// Ring buffer per category, oldest entry evicted first.
///
/// All category buffers sit behind one lock so a recorded snapshot becomes
/// visible to readers in every category at once.
pub struct HistoryStore {
    capacity: usize,
    buffers: RwLock<HashMap<MetricCategory, VecDeque<HistoryEntry>>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append every category of `snapshot` under its timestamp
    pub async fn record(&self, snapshot: &Snapshot) {
        let mut buffers = self.buffers.write().await;

        for record in snapshot.records() {
            let category = record.category();
            let buffer = buffers
                .entry(category)
                .or_insert_with(|| VecDeque::with_capacity(self.capacity.min(64)));

            // Evict before pushing so the bound holds at every point.
            while buffer.len() >= self.capacity {
                buffer.pop_front();
            }
            buffer.push_back(HistoryEntry {
                timestamp: snapshot.timestamp,
                category,
                record,
            });
        }
    }

    /// At most `limit` most-recent entries for `category`, oldest first
    pub async fn query(&self, category: MetricCategory, limit: usize) -> Vec<HistoryEntry> {
        let buffers = self.buffers.read().await;
        match buffers.get(&category) {
            Some(buffer) => {
                let skip = buffer.len().saturating_sub(limit);
                buffer.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Most recent record of every category that has one
    pub async fn latest(&self) -> BTreeMap<MetricCategory, CategoryRecord> {
        let buffers = self.buffers.read().await;
        buffers
            .iter()
            .filter_map(|(category, buffer)| {
                buffer.back().map(|entry| (*category, entry.record.clone()))
            })
            .collect()
    }

    pub async fn len(&self, category: MetricCategory) -> usize {
        self.buffers
            .read()
            .await
            .get(&category)
            .map_or(0, VecDeque::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.buffers.read().await.values().all(VecDeque::is_empty)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
