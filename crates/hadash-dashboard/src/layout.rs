//! Layout merge engine
//!
//! The default layout definition owns the item universe; the persisted
//! layout only contributes geometry. Merging overlays saved positions on
//! the current defaults, so items added to the defaults appear with
//! default geometry and items removed from them drop out even when a
//! stale saved entry remains.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use hadash_storage::{Storable, Storage};

/// Storage key for the grid layout
pub const STORAGE_KEY: &str = "dashboard.layout";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 1;

/// Persisted geometry for one grid item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayoutItem {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A grid item as the rendering layer consumes it: saved geometry plus
/// the component identity and display props only the default layout
/// definition supplies. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridItem {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    /// Component identity used by the rendering grid
    pub component: String,
    /// Free-form display properties forwarded to the component
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub props: Value,
}

impl GridItem {
    /// The persistable geometry of this item
    pub fn geometry(&self) -> SavedLayoutItem {
        SavedLayoutItem {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Saved layout for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LayoutData {
    #[serde(default)]
    items: Vec<SavedLayoutItem>,
}

impl Storable for LayoutData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Reconciles the persisted grid layout with the current defaults
pub struct LayoutEngine {
    /// Storage backend
    storage: Arc<Storage>,

    /// Saved geometry, empty until [`LayoutEngine::load`] finds a file
    saved: RwLock<Vec<SavedLayoutItem>>,
}

impl LayoutEngine {
    /// Create a new engine with no saved layout
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            saved: RwLock::new(Vec::new()),
        }
    }

    /// Restore the persisted layout.
    ///
    /// Absence or a parse failure yields the empty saved state; every
    /// item then falls back to its default geometry.
    pub async fn load(&self) {
        match self.storage.load_value::<LayoutData>().await {
            Ok(Some(data)) => {
                debug!(items = data.items.len(), "Loaded layout from storage");
                if let Ok(mut saved) = self.saved.write() {
                    *saved = data.items;
                }
            }
            Ok(None) => debug!("No saved layout, using defaults"),
            Err(err) => warn!(error = %err, "Failed to load layout, using defaults"),
        }
    }

    /// Snapshot of the saved geometry
    pub fn saved(&self) -> Vec<SavedLayoutItem> {
        self.saved.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Overlay saved geometry on the current default layout.
    ///
    /// For each default item, saved `x,y,w,h` win when an entry with the
    /// same id exists; component identity and props always come from the
    /// default. Saved entries without a default counterpart are dropped.
    pub fn merge(&self, defaults: &[GridItem]) -> Vec<GridItem> {
        let saved = self.saved();
        if saved.is_empty() {
            return defaults.to_vec();
        }

        let positions: HashMap<&str, &SavedLayoutItem> =
            saved.iter().map(|item| (item.id.as_str(), item)).collect();

        defaults
            .iter()
            .map(|item| match positions.get(item.id.as_str()) {
                Some(saved) => GridItem {
                    x: saved.x,
                    y: saved.y,
                    w: saved.w,
                    h: saved.h,
                    ..item.clone()
                },
                None => item.clone(),
            })
            .collect()
    }

    /// Persist a full layout wholesale and adopt it as the saved state.
    ///
    /// Called on every user-driven layout mutation; there is no diffing,
    /// the previous saved set is always replaced.
    pub async fn save(&self, items: Vec<SavedLayoutItem>) {
        let data = LayoutData {
            items: items.clone(),
        };
        if let Err(err) = self.storage.save_value(&data).await {
            warn!(error = %err, "Failed to persist layout");
        }
        if let Ok(mut saved) = self.saved.write() {
            *saved = items;
        }
    }
}
