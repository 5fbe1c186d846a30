//! Live dashboard state
//!
//! Owns the entity map, the filtered directory derived from the
//! registries, and the optional server connection. In local mode the
//! map is seeded from the fixture snapshot and mutated in place; in
//! remote mode every entity push from the server replaces the map
//! wholesale.

use std::sync::{Arc, RwLock};

use tracing::{debug, error, info};

use hadash_core::directory::build_directory;
use hadash_core::{domain_of, EntityMap, EntityState, EntityWithRegistry, STATE_ON, UNKNOWN_DOMAIN};
use hadash_dashboard::UsageTracker;

use crate::config::{DashboardConfig, DataSource};
use crate::connection::Connection;
use crate::error::ClientError;
use crate::fixtures;

/// Entity state, directory and connection for one dashboard session
pub struct DashboardState {
    source: DataSource,
    allowed_prefixes: Vec<String>,
    blocked_entities: Vec<String>,
    usage: Arc<UsageTracker>,
    entities: Arc<RwLock<EntityMap>>,
    directory: RwLock<Vec<EntityWithRegistry>>,
    connection: RwLock<Option<Arc<Connection>>>,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig, usage: Arc<UsageTracker>) -> Self {
        Self {
            source: config.source.clone(),
            allowed_prefixes: config.allowed_prefixes.clone(),
            blocked_entities: config.blocked_entities.clone(),
            usage,
            entities: Arc::new(RwLock::new(EntityMap::new())),
            directory: RwLock::new(Vec::new()),
            connection: RwLock::new(None),
        }
    }

    /// Populate the entity map and directory from the configured source.
    ///
    /// Local mode adopts the fixture snapshot. Remote mode connects,
    /// subscribes to entity pushes, then fetches both registries; any
    /// failure along that path is logged and propagated.
    pub async fn load_data(&self) -> Result<(), ClientError> {
        match &self.source {
            DataSource::Local => {
                let states = fixtures::entity_states();
                let directory = build_directory(
                    &fixtures::devices(),
                    &fixtures::registry_entries(),
                    &self.allowed_prefixes,
                    &self.blocked_entities,
                );
                info!(
                    entities = states.len(),
                    directory = directory.len(),
                    "Loaded fixture data"
                );
                if let Ok(mut map) = self.entities.write() {
                    *map = states;
                }
                if let Ok(mut dir) = self.directory.write() {
                    *dir = directory;
                }
                Ok(())
            }
            DataSource::Remote { url, token } => {
                let connection = match Connection::connect(url, token).await {
                    Ok(connection) => connection,
                    Err(err) => {
                        error!(error = %err, "Failed to connect to server");
                        return Err(err);
                    }
                };

                let entities = Arc::clone(&self.entities);
                let subscribe = connection
                    .subscribe_entities(Arc::new(move |map| {
                        debug!(entities = map.len(), "Entity push received");
                        if let Ok(mut current) = entities.write() {
                            *current = map;
                        }
                    }))
                    .await;
                if let Err(err) = subscribe {
                    error!(error = %err, "Entity subscription failed");
                    return Err(err);
                }

                let devices = match connection.list_devices().await {
                    Ok(devices) => devices,
                    Err(err) => {
                        error!(error = %err, "Device registry fetch failed");
                        return Err(err);
                    }
                };
                let entries = match connection.list_entities().await {
                    Ok(entries) => entries,
                    Err(err) => {
                        error!(error = %err, "Entity registry fetch failed");
                        return Err(err);
                    }
                };

                let directory = build_directory(
                    &devices,
                    &entries,
                    &self.allowed_prefixes,
                    &self.blocked_entities,
                );
                info!(
                    devices = devices.len(),
                    directory = directory.len(),
                    "Loaded remote registries"
                );
                if let Ok(mut dir) = self.directory.write() {
                    *dir = directory;
                }
                if let Ok(mut slot) = self.connection.write() {
                    *slot = Some(connection);
                }
                Ok(())
            }
        }
    }

    /// Record an interaction and toggle the entity.
    ///
    /// Usage is tracked before the toggle is attempted so that even
    /// failed service calls count as interest in the entity. Local mode
    /// flips the cached state directly; remote mode asks the server and
    /// waits for the push to update the map.
    pub async fn update_state(&self, entity_id: &str, current_state: &str) -> Result<(), ClientError> {
        if entity_id.is_empty() {
            return Ok(());
        }
        self.usage.track(entity_id).await;

        match &self.source {
            DataSource::Local => {
                if let Ok(mut map) = self.entities.write() {
                    if let Some(state) = map.get(entity_id) {
                        let toggled = state.toggled();
                        debug!(entity_id, state = %toggled.state, "Toggled local entity");
                        map.insert(entity_id.to_string(), toggled);
                    } else {
                        error!(entity_id, "No such entity in local snapshot");
                    }
                }
                Ok(())
            }
            DataSource::Remote { .. } => {
                let domain = domain_of(entity_id);
                if domain == UNKNOWN_DOMAIN {
                    error!(entity_id, "Cannot toggle entity without a domain");
                    return Ok(());
                }
                let Some(connection) = self.connection() else {
                    error!(entity_id, "No active connection for service call");
                    return Ok(());
                };
                let service = if current_state == STATE_ON {
                    "turn_off"
                } else {
                    "turn_on"
                };
                if let Err(err) = connection.call_service(domain, service, entity_id).await {
                    error!(entity_id, service, error = %err, "Service call failed");
                    return Err(err);
                }
                debug!(entity_id, service, "Service call dispatched");
                Ok(())
            }
        }
    }

    /// Snapshot of the current entity map
    pub fn entities(&self) -> EntityMap {
        self.entities
            .read()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    /// Current state of one entity
    pub fn entity(&self, entity_id: &str) -> Option<EntityState> {
        self.entities
            .read()
            .ok()
            .and_then(|map| map.get(entity_id).cloned())
    }

    /// The filtered, sorted entity directory
    pub fn directory(&self) -> Vec<EntityWithRegistry> {
        self.directory
            .read()
            .map(|dir| dir.clone())
            .unwrap_or_default()
    }

    /// The active connection, if remote mode is connected
    pub fn connection(&self) -> Option<Arc<Connection>> {
        self.connection
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(Arc::clone))
    }

    /// Close the connection and drop it from the session
    pub async fn disconnect(&self) {
        let connection = self
            .connection
            .write()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(connection) = connection {
            connection.close().await;
            debug!("Disconnected from server");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadash_storage::Storage;
    use tempfile::TempDir;

    fn local_state(dir: &TempDir) -> DashboardState {
        let storage = Arc::new(Storage::new(dir.path()));
        let usage = Arc::new(UsageTracker::new(storage));
        DashboardState::new(&DashboardConfig::default(), usage)
    }

    fn remote_state(dir: &TempDir) -> DashboardState {
        let storage = Arc::new(Storage::new(dir.path()));
        let usage = Arc::new(UsageTracker::new(storage));
        let config = DashboardConfig {
            source: DataSource::Remote {
                url: "http://hass.local:8123".into(),
                token: "token".into(),
            },
            ..DashboardConfig::default()
        };
        DashboardState::new(&config, usage)
    }

    #[tokio::test]
    async fn test_local_load_populates_map_and_directory() {
        let dir = TempDir::new().unwrap();
        let state = local_state(&dir);

        state.load_data().await.unwrap();

        assert!(state.entity("light.living_room_lamp").is_some());
        let directory = state.directory();
        assert!(!directory.is_empty());
        // Allow-list keeps the sensor out, missing area keeps the garage out
        assert!(directory
            .iter()
            .all(|e| e.entity_id() != "sensor.kitchen_temperature"));
        assert!(directory.iter().all(|e| e.entity_id() != "switch.garage_door"));
    }

    #[tokio::test]
    async fn test_local_toggle_flips_state_and_counts_usage() {
        let dir = TempDir::new().unwrap();
        let state = local_state(&dir);
        state.load_data().await.unwrap();

        assert_eq!(state.entity("fan.bedroom_ceiling").unwrap().state, "off");
        state.update_state("fan.bedroom_ceiling", "off").await.unwrap();
        assert_eq!(state.entity("fan.bedroom_ceiling").unwrap().state, "on");
        assert_eq!(state.usage.count("fan.bedroom_ceiling"), 1);
    }

    #[tokio::test]
    async fn test_empty_entity_id_is_ignored() {
        let dir = TempDir::new().unwrap();
        let state = local_state(&dir);
        state.load_data().await.unwrap();

        state.update_state("", "on").await.unwrap();
        assert_eq!(state.usage.count(""), 0);
    }

    #[tokio::test]
    async fn test_remote_toggle_without_connection_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let state = remote_state(&dir);

        // Never connected: no service call can be made, but the caller
        // does not see a fault and interest is still recorded
        state.update_state("light.lamp", "on").await.unwrap();
        assert!(state.connection().is_none());
        assert_eq!(state.usage.count("light.lamp"), 1);
    }

    #[tokio::test]
    async fn test_remote_toggle_without_domain_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let state = remote_state(&dir);

        state.update_state("no_dot", "on").await.unwrap();
        assert_eq!(state.usage.count("no_dot"), 1);
    }

    #[tokio::test]
    async fn test_local_toggle_ignores_domain_resolution() {
        let dir = TempDir::new().unwrap();
        let state = local_state(&dir);
        if let Ok(mut map) = state.entities.write() {
            map.insert(
                "no_dot".to_string(),
                EntityState::new("no_dot", "on", Default::default()),
            );
        }

        // Local mode only needs the cached entry, not a parseable domain
        state.update_state("no_dot", "on").await.unwrap();
        assert_eq!(state.entity("no_dot").unwrap().state, "off");
    }

    #[tokio::test]
    async fn test_unknown_entity_toggle_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let state = local_state(&dir);
        state.load_data().await.unwrap();

        state.update_state("light.not_here", "off").await.unwrap();
        assert!(state.entity("light.not_here").is_none());
        // Interest is still recorded
        assert_eq!(state.usage.count("light.not_here"), 1);
    }
}
