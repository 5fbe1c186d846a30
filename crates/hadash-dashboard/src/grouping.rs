//! Grouping engine
//!
//! Derives mutually exclusive grouping views over the entity directory:
//! by room, by entity type, by usage frequency, or none. The active mode
//! is persisted; the groups themselves are derived on every read so they
//! always reflect the latest directory and counters.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hadash_core::EntityWithRegistry;
use hadash_storage::{Storable, Storage};

/// Storage key for the active grouping mode
pub const STORAGE_KEY: &str = "dashboard.grouping_mode";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 1;

/// How the directory is partitioned for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// One group per area
    #[default]
    Room,
    /// One group per entity domain
    EntityType,
    /// Usage tiers (most/sometimes/rarely used)
    Frequency,
    /// Single flat list sorted by usage
    None,
}

/// Active grouping mode for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupingModeData {
    mode: GroupingMode,
}

impl Storable for GroupingModeData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// A derived presentation group
///
/// Never persisted; recomputed whenever the directory, the usage
/// counters, or the mode change.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    pub id: String,
    pub name: String,
    pub entities: Vec<EntityWithRegistry>,
}

/// Holds the active grouping mode and derives groups on demand
pub struct GroupingEngine {
    /// Storage backend
    storage: Arc<Storage>,

    /// Active mode, defaults to [`GroupingMode::Room`]
    mode: RwLock<GroupingMode>,
}

impl GroupingEngine {
    /// Create a new engine in the default mode
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            mode: RwLock::new(GroupingMode::default()),
        }
    }

    /// Restore the persisted mode.
    ///
    /// An absent file, or one whose value no longer matches the mode
    /// enum, leaves the default mode in place.
    pub async fn load(&self) {
        match self.storage.load_value::<GroupingModeData>().await {
            Ok(Some(data)) => {
                debug!(mode = ?data.mode, "Loaded grouping mode from storage");
                if let Ok(mut mode) = self.mode.write() {
                    *mode = data.mode;
                }
            }
            Ok(None) => debug!("No saved grouping mode, using default"),
            Err(err) => warn!(error = %err, "Failed to load grouping mode, using default"),
        }
    }

    /// The active grouping mode
    pub fn mode(&self) -> GroupingMode {
        self.mode.read().map(|m| *m).unwrap_or_default()
    }

    /// Switch the active mode and persist the selection
    pub async fn set_mode(&self, mode: GroupingMode) {
        if let Ok(mut current) = self.mode.write() {
            *current = mode;
        }
        let data = GroupingModeData { mode };
        if let Err(err) = self.storage.save_value(&data).await {
            warn!(error = %err, "Failed to persist grouping mode");
        }
    }

    /// Derive the groups for the active mode
    pub fn groups(
        &self,
        directory: &[EntityWithRegistry],
        usage: &HashMap<String, u64>,
    ) -> Vec<EntityGroup> {
        match self.mode() {
            GroupingMode::Room => group_by_room(directory),
            GroupingMode::EntityType => group_by_entity_type(directory),
            GroupingMode::Frequency => group_by_frequency(directory, usage),
            GroupingMode::None => ungrouped(directory, usage),
        }
    }
}

/// Capitalize the first character and replace underscores with spaces
fn format_group_name(name: &str) -> String {
    let mut chars = name.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    capitalized.replace('_', " ")
}

fn usage_of(usage: &HashMap<String, u64>, entity: &EntityWithRegistry) -> u64 {
    usage.get(entity.entity_id()).copied().unwrap_or(0)
}

/// One group per distinct area, entities in directory order
pub fn group_by_room(directory: &[EntityWithRegistry]) -> Vec<EntityGroup> {
    let mut by_area: IndexMap<&str, Vec<EntityWithRegistry>> = IndexMap::new();
    for entity in directory {
        by_area
            .entry(entity.area_id.as_str())
            .or_default()
            .push(entity.clone());
    }

    by_area
        .into_iter()
        .map(|(area_id, entities)| EntityGroup {
            id: format!("room-{area_id}"),
            name: format_group_name(area_id),
            entities,
        })
        .collect()
}

/// One group per distinct domain, display name pluralized
pub fn group_by_entity_type(directory: &[EntityWithRegistry]) -> Vec<EntityGroup> {
    let mut by_domain: IndexMap<&str, Vec<EntityWithRegistry>> = IndexMap::new();
    for entity in directory {
        by_domain.entry(entity.domain()).or_default().push(entity.clone());
    }

    by_domain
        .into_iter()
        .map(|(domain, entities)| EntityGroup {
            id: format!("type-{domain}"),
            name: format_group_name(&format!("{domain}s")),
            entities,
        })
        .collect()
}

/// Usage tiers relative to the highest counter.
///
/// Tier boundaries: high is at least half the maximum counter, medium is
/// any non-zero counter below that, low is zero. Within a tier, entities
/// are ordered by descending counter with directory order breaking ties;
/// empty tiers are omitted. With no usage recorded at all, a single
/// `freq-all` group carries the whole directory instead.
pub fn group_by_frequency(
    directory: &[EntityWithRegistry],
    usage: &HashMap<String, u64>,
) -> Vec<EntityGroup> {
    if usage.values().all(|count| *count == 0) {
        return vec![EntityGroup {
            id: "freq-all".into(),
            name: "All Entities".into(),
            entities: directory.to_vec(),
        }];
    }

    let mut sorted = directory.to_vec();
    sorted.sort_by_key(|e| Reverse(usage_of(usage, e)));

    let max_usage = usage.values().copied().max().unwrap_or(0).max(1);
    let half = max_usage as f64 * 0.5;

    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();
    for entity in sorted {
        let count = usage_of(usage, &entity);
        if count as f64 >= half {
            high.push(entity);
        } else if count > 0 {
            medium.push(entity);
        } else {
            low.push(entity);
        }
    }

    let tiers = [
        ("freq-high", "Most Used", high),
        ("freq-medium", "Sometimes Used", medium),
        ("freq-low", "Rarely Used", low),
    ];

    tiers
        .into_iter()
        .filter(|(_, _, entities)| !entities.is_empty())
        .map(|(id, name, entities)| EntityGroup {
            id: id.into(),
            name: name.into(),
            entities,
        })
        .collect()
}

/// Single flat group sorted by descending usage
pub fn ungrouped(
    directory: &[EntityWithRegistry],
    usage: &HashMap<String, u64>,
) -> Vec<EntityGroup> {
    let mut entities = directory.to_vec();
    entities.sort_by_key(|e| Reverse(usage_of(usage, e)));

    vec![EntityGroup {
        id: "ungrouped-all".into(),
        name: "All Entities".into(),
        entities,
    }]
}
