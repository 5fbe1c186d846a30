//! Per-entity usage counters
//!
//! Counters only ever go up: one increment per toggle, persisted
//! wholesale after every increment. A failed persist is logged and the
//! in-memory counter stands for the rest of the session.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hadash_storage::{Storable, Storage};

/// Storage key for usage counters
pub const STORAGE_KEY: &str = "dashboard.usage_stats";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 1;

/// Usage counters for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStatsData {
    #[serde(default)]
    pub stats: HashMap<String, u64>,
}

impl Storable for UsageStatsData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Tracks how often each entity has been toggled
pub struct UsageTracker {
    /// Storage backend
    storage: Arc<Storage>,

    /// Counter per entity id, monotonically non-decreasing
    counters: DashMap<String, u64>,
}

impl UsageTracker {
    /// Create a new tracker with empty counters
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            counters: DashMap::new(),
        }
    }

    /// Restore counters from storage
    ///
    /// A missing or unreadable file leaves the counters empty; storage
    /// faults never propagate past this component.
    pub async fn load(&self) {
        match self.storage.load_value::<UsageStatsData>().await {
            Ok(Some(data)) => {
                debug!(entities = data.stats.len(), "Loaded usage stats from storage");
                for (entity_id, count) in data.stats {
                    self.counters.insert(entity_id, count);
                }
            }
            Ok(None) => debug!("No saved usage stats, starting empty"),
            Err(err) => warn!(error = %err, "Failed to load usage stats, starting empty"),
        }
    }

    /// Increment the counter for an entity and persist the whole map.
    ///
    /// Returns the new counter value.
    pub async fn track(&self, entity_id: &str) -> u64 {
        let count = {
            let mut entry = self.counters.entry(entity_id.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        debug!(entity_id, count, "Tracked entity usage");

        let data = UsageStatsData {
            stats: self.snapshot(),
        };
        if let Err(err) = self.storage.save_value(&data).await {
            warn!(error = %err, "Failed to persist usage stats");
        }

        count
    }

    /// Current counter for an entity, zero if never tracked
    pub fn count(&self, entity_id: &str) -> u64 {
        self.counters.get(entity_id).map(|c| *c).unwrap_or(0)
    }

    /// Snapshot of all counters, consumed by the grouping derivations
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect()
    }
}
