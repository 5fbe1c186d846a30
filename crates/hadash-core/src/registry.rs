//! Device and entity registry entry types
//!
//! Registry data is the static catalog of devices and entities, fetched
//! once per load from the remote registry list commands (or taken from the
//! local fixture snapshot). It is distinct from live state.

use serde::{Deserialize, Serialize};

/// A device registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Internal device id
    pub id: String,

    /// Device name from the integration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// User-set name, preferred over `name` for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_by_user: Option<String>,

    /// Assigned area; devices without one never reach the directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,

    /// Disable reason, if the device is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<String>,
}

impl Device {
    /// Display name (user name or device name)
    pub fn display_name(&self) -> Option<&str> {
        self.name_by_user.as_deref().or(self.name.as_deref())
    }
}

/// An entity registry entry, keyed by its dotted entity id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Full entity id (`domain.object_id`)
    pub entity_id: String,

    /// User-set name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Platform default name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    /// Platform-specific unique identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    /// Integration that provides this entity
    pub platform: String,

    /// Owning device, when the entity belongs to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Area assigned directly on the entity (rarely set; the directory
    /// resolves areas through the owning device)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,

    #[serde(default)]
    pub has_entity_name: bool,
}

/// A registry entry enriched by the directory builder
///
/// Only the builder constructs this type: it exists solely for entries
/// whose owning device resolved to a concrete area and whose id passed the
/// allow/block filters, so `area_id` is always present here.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWithRegistry {
    /// The underlying registry entry
    pub entry: RegistryEntry,

    /// Area resolved from the owning device
    pub area_id: String,

    /// Display name of the owning device
    pub device_name: Option<String>,
}

impl EntityWithRegistry {
    /// Full entity id of the underlying entry
    pub fn entity_id(&self) -> &str {
        &self.entry.entity_id
    }

    /// The entity's domain, derived from its id
    pub fn domain(&self) -> &str {
        crate::entity_id::domain_of(&self.entry.entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_display_name_prefers_user_name() {
        let device = Device {
            id: "d1".into(),
            name: Some("Hue Bulb".into()),
            name_by_user: Some("Reading Lamp".into()),
            area_id: None,
            manufacturer: None,
            model: None,
            sw_version: None,
            disabled_by: None,
        };
        assert_eq!(device.display_name(), Some("Reading Lamp"));
    }

    #[test]
    fn test_registry_entry_tolerates_sparse_payload() {
        let entry: RegistryEntry = serde_json::from_value(json!({
            "entity_id": "light.lamp",
            "platform": "hue"
        }))
        .unwrap();

        assert_eq!(entry.entity_id, "light.lamp");
        assert!(entry.device_id.is_none());
        assert!(!entry.has_entity_name);
    }
}
