//! Entity directory builder
//!
//! Joins the device and entity registries into the filtered, sorted,
//! enriched list the dashboard renders from. The directory is rebuilt
//! wholesale on every load and never patched incrementally.

use tracing::debug;

use crate::registry::{Device, EntityWithRegistry, RegistryEntry};

/// Build the entity directory from raw registry data.
///
/// An entry is included iff its owning device has a non-null area, its
/// entity id starts with at least one allow-list prefix, and its id is not
/// an exact member of the block-list. Entries with no `device_id` match no
/// device and are dropped silently; that is "no entities for this device",
/// not a fault.
///
/// Pure function of its inputs: a fresh output vector is allocated per
/// call, so repeated loads cannot accumulate duplicates. The result is
/// sorted strictly ascending by entity id (ordinal comparison).
pub fn build_directory(
    devices: &[Device],
    entries: &[RegistryEntry],
    allowed_prefixes: &[String],
    blocked: &[String],
) -> Vec<EntityWithRegistry> {
    let mut directory = Vec::new();

    for device in devices {
        let Some(area_id) = device.area_id.as_deref() else {
            continue;
        };

        for entry in entries {
            if entry.device_id.as_deref() != Some(device.id.as_str()) {
                continue;
            }

            let id = entry.entity_id.as_str();
            if !allowed_prefixes.iter().any(|p| id.starts_with(p.as_str())) {
                continue;
            }
            if blocked.iter().any(|b| b == id) {
                continue;
            }

            directory.push(EntityWithRegistry {
                entry: entry.clone(),
                area_id: area_id.to_string(),
                device_name: device.display_name().map(str::to_string),
            });
        }
    }

    directory.sort_by(|a, b| a.entry.entity_id.cmp(&b.entry.entity_id));
    debug!(entities = directory.len(), "Built entity directory");
    directory
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str, area_id: Option<&str>) -> Device {
        Device {
            id: id.into(),
            name: Some(name.into()),
            name_by_user: None,
            area_id: area_id.map(str::to_string),
            manufacturer: None,
            model: None,
            sw_version: None,
            disabled_by: None,
        }
    }

    fn entry(entity_id: &str, device_id: Option<&str>) -> RegistryEntry {
        RegistryEntry {
            entity_id: entity_id.into(),
            name: None,
            original_name: None,
            unique_id: None,
            platform: "test".into(),
            device_id: device_id.map(str::to_string),
            area_id: None,
            disabled_by: None,
            hidden_by: None,
            icon: None,
            entity_category: None,
            has_entity_name: false,
        }
    }

    fn prefixes(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_single_entity() {
        let devices = vec![device("d1", "Device1", Some("living_room"))];
        let entries = vec![entry("light.lamp", Some("d1"))];

        let directory = build_directory(&devices, &entries, &prefixes(&["light."]), &[]);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory[0].entity_id(), "light.lamp");
        assert_eq!(directory[0].area_id, "living_room");
        assert_eq!(directory[0].device_name.as_deref(), Some("Device1"));
    }

    #[test]
    fn test_device_without_area_is_excluded() {
        let devices = vec![device("d1", "Device1", None)];
        let entries = vec![entry("light.lamp", Some("d1"))];

        let directory = build_directory(&devices, &entries, &prefixes(&["light."]), &[]);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_entry_without_device_is_excluded_silently() {
        let devices = vec![device("d1", "Device1", Some("kitchen"))];
        let entries = vec![entry("light.orphan", None), entry("light.lamp", Some("d1"))];

        let directory = build_directory(&devices, &entries, &prefixes(&["light."]), &[]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory[0].entity_id(), "light.lamp");
    }

    #[test]
    fn test_allow_list_filters_by_prefix() {
        let devices = vec![device("d1", "Device1", Some("kitchen"))];
        let entries = vec![
            entry("light.lamp", Some("d1")),
            entry("sensor.temperature", Some("d1")),
        ];

        let directory =
            build_directory(&devices, &entries, &prefixes(&["light.", "fan."]), &[]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory[0].entity_id(), "light.lamp");
    }

    #[test]
    fn test_block_list_matches_exact_ids_only() {
        let devices = vec![device("d1", "Device1", Some("kitchen"))];
        let entries = vec![
            entry("light.lamp", Some("d1")),
            entry("light.lamp_two", Some("d1")),
        ];

        let directory = build_directory(
            &devices,
            &entries,
            &prefixes(&["light."]),
            &prefixes(&["light.lamp"]),
        );
        assert_eq!(directory.len(), 1);
        assert_eq!(directory[0].entity_id(), "light.lamp_two");
    }

    #[test]
    fn test_directory_sorted_and_deterministic() {
        let devices = vec![
            device("d2", "Device2", Some("bedroom")),
            device("d1", "Device1", Some("living_room")),
        ];
        let entries = vec![
            entry("switch.coffee", Some("d1")),
            entry("fan.ceiling", Some("d2")),
            entry("light.lamp", Some("d1")),
        ];
        let allow = prefixes(&["light.", "fan.", "switch."]);

        let first = build_directory(&devices, &entries, &allow, &[]);
        let ids: Vec<_> = first.iter().map(|e| e.entity_id()).collect();
        assert_eq!(ids, vec!["fan.ceiling", "light.lamp", "switch.coffee"]);

        // Rebuilding from identical inputs yields an identical sequence
        let second = build_directory(&devices, &entries, &allow, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_user_device_name_is_preferred() {
        let mut dev = device("d1", "Hue Bulb", Some("study"));
        dev.name_by_user = Some("Desk Lamp".into());
        let entries = vec![entry("light.desk", Some("d1"))];

        let directory = build_directory(&[dev], &entries, &prefixes(&["light."]), &[]);
        assert_eq!(directory[0].device_name.as_deref(), Some("Desk Lamp"));
    }
}
