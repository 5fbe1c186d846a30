//! Dashboard session facade
//!
//! Wires the storage-backed components and the live state together
//! behind one handle. Construction restores everything persisted;
//! `load_data` then populates the entity map from the configured
//! source.

use std::sync::Arc;

use tracing::info;

use hadash_core::{EntityMap, EntityState, EntityWithRegistry};
use hadash_dashboard::{
    EntityGroup, GridItem, GroupingEngine, GroupingMode, LayoutEngine, SavedLayoutItem,
    UsageTracker,
};
use hadash_storage::Storage;

use crate::config::DashboardConfig;
use crate::error::ClientError;
use crate::fixtures;
use crate::state::DashboardState;

/// One dashboard session: persisted preferences plus live state
pub struct Dashboard {
    config: DashboardConfig,
    usage: Arc<UsageTracker>,
    grouping: GroupingEngine,
    layout: LayoutEngine,
    state: DashboardState,
}

impl Dashboard {
    /// Build a session and restore all persisted state.
    ///
    /// Storage faults are absorbed by the individual components, so
    /// construction always succeeds with at least the defaults.
    pub async fn init(config: DashboardConfig) -> Self {
        let storage = Arc::new(Storage::new(&config.config_dir));

        let usage = Arc::new(UsageTracker::new(Arc::clone(&storage)));
        usage.load().await;

        let grouping = GroupingEngine::new(Arc::clone(&storage));
        grouping.load().await;

        let layout = LayoutEngine::new(Arc::clone(&storage));
        layout.load().await;

        let state = DashboardState::new(&config, Arc::clone(&usage));
        info!(source = ?config.source, "Dashboard session ready");

        Self {
            config,
            usage,
            grouping,
            layout,
            state,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Populate entities and directory from the configured source
    pub async fn load_data(&self) -> Result<(), ClientError> {
        self.state.load_data().await
    }

    /// Record an interaction and toggle the entity
    pub async fn update_state(
        &self,
        entity_id: &str,
        current_state: &str,
    ) -> Result<(), ClientError> {
        self.state.update_state(entity_id, current_state).await
    }

    /// Snapshot of the current entity map
    pub fn entities(&self) -> EntityMap {
        self.state.entities()
    }

    /// Current state of one entity
    pub fn entity(&self, entity_id: &str) -> Option<EntityState> {
        self.state.entity(entity_id)
    }

    /// The filtered, sorted entity directory
    pub fn directory(&self) -> Vec<EntityWithRegistry> {
        self.state.directory()
    }

    /// Usage counter for one entity
    pub fn usage_count(&self, entity_id: &str) -> u64 {
        self.usage.count(entity_id)
    }

    /// The active grouping mode
    pub fn grouping_mode(&self) -> GroupingMode {
        self.grouping.mode()
    }

    /// Switch the grouping mode and persist the selection
    pub async fn set_grouping_mode(&self, mode: GroupingMode) {
        self.grouping.set_mode(mode).await;
    }

    /// Derive the presentation groups for the active mode from the
    /// current directory and usage counters
    pub fn current_groups(&self) -> Vec<EntityGroup> {
        self.grouping
            .groups(&self.state.directory(), &self.usage.snapshot())
    }

    /// The default layout with saved geometry overlaid
    pub fn merge_layout(&self, defaults: &[GridItem]) -> Vec<GridItem> {
        self.layout.merge(defaults)
    }

    /// The demo default layout merged with saved geometry
    pub fn demo_layout(&self) -> Vec<GridItem> {
        self.layout.merge(&fixtures::default_layout())
    }

    /// Persist a full layout wholesale
    pub async fn save_layout(&self, items: Vec<SavedLayoutItem>) {
        self.layout.save(items).await;
    }

    /// Close the server connection, if any
    pub async fn dispose(&self) {
        self.state.disconnect().await;
        info!("Dashboard session disposed");
    }
}
