//! Static fixture snapshot powering local mode
//!
//! A small demo home: enough devices, registry entries and live states
//! to exercise every directory filter and grouping view without a
//! server. The garage opener has no area and the kitchen temperature
//! sensor misses the allow-list, so neither reaches the directory.

use serde_json::json;

use hadash_core::{
    ClimateAttributes, Device, EntityAttributes, EntityMap, EntityState, FanAttributes,
    LightAttributes, RegistryEntry, SwitchAttributes, STATE_OFF, STATE_ON,
};
use hadash_dashboard::GridItem;

fn device(id: &str, name: &str, area_id: Option<&str>, manufacturer: &str) -> Device {
    Device {
        id: id.into(),
        name: Some(name.into()),
        name_by_user: None,
        area_id: area_id.map(str::to_string),
        manufacturer: Some(manufacturer.into()),
        model: None,
        sw_version: None,
        disabled_by: None,
    }
}

fn entry(entity_id: &str, device_id: &str, platform: &str) -> RegistryEntry {
    RegistryEntry {
        entity_id: entity_id.into(),
        name: None,
        original_name: None,
        unique_id: Some(format!("fixture-{entity_id}")),
        platform: platform.into(),
        device_id: Some(device_id.into()),
        area_id: None,
        disabled_by: None,
        hidden_by: None,
        icon: None,
        entity_category: None,
        has_entity_name: false,
    }
}

/// The fixture device registry
pub fn devices() -> Vec<Device> {
    vec![
        device("d_living", "Living Room Hub", Some("living_room"), "Hue"),
        device("d_bedroom", "Bedroom Fan", Some("bedroom"), "Haiku"),
        device("d_kitchen", "Kitchen Plug", Some("kitchen"), "Shelly"),
        device("d_hallway", "Hallway Thermostat", Some("hallway"), "Ecobee"),
        // No area assigned, never reaches the directory
        device("d_garage", "Garage Opener", None, "Chamberlain"),
    ]
}

/// The fixture entity registry
pub fn registry_entries() -> Vec<RegistryEntry> {
    vec![
        entry("light.living_room_lamp", "d_living", "hue"),
        entry("light.living_room_overhead", "d_living", "hue"),
        entry("fan.bedroom_ceiling", "d_bedroom", "haiku"),
        entry("switch.coffee_maker", "d_kitchen", "shelly"),
        // Outside the default allow-list
        entry("sensor.kitchen_temperature", "d_kitchen", "shelly"),
        entry("climate.hallway", "d_hallway", "ecobee"),
        entry("switch.garage_door", "d_garage", "myq"),
    ]
}

/// The fixture entity-state snapshot adopted as the live map in local mode
pub fn entity_states() -> EntityMap {
    let states = [
        EntityState::new(
            "light.living_room_lamp",
            STATE_ON,
            EntityAttributes::Light(LightAttributes {
                friendly_name: Some("Living Room Lamp".into()),
                brightness: Some(180),
                ..Default::default()
            }),
        ),
        EntityState::new(
            "light.living_room_overhead",
            STATE_OFF,
            EntityAttributes::Light(LightAttributes {
                friendly_name: Some("Living Room Overhead".into()),
                ..Default::default()
            }),
        ),
        EntityState::new(
            "fan.bedroom_ceiling",
            STATE_OFF,
            EntityAttributes::Fan(FanAttributes {
                friendly_name: Some("Bedroom Ceiling Fan".into()),
                percentage: Some(40),
                ..Default::default()
            }),
        ),
        EntityState::new(
            "switch.coffee_maker",
            STATE_OFF,
            EntityAttributes::Switch(SwitchAttributes {
                friendly_name: Some("Coffee Maker".into()),
            }),
        ),
        EntityState::new(
            "climate.hallway",
            "heat",
            EntityAttributes::Climate(ClimateAttributes {
                friendly_name: Some("Hallway Thermostat".into()),
                hvac_modes: vec!["heat".into(), "cool".into(), "off".into()],
                current_temperature: Some(20.5),
                temperature: Some(21.0),
                ..Default::default()
            }),
        ),
        EntityState::new(
            "sensor.kitchen_temperature",
            "22.4",
            EntityAttributes::default(),
        ),
    ];

    states
        .into_iter()
        .map(|state| (state.entity_id.clone(), state))
        .collect()
}

/// The demo default layout definition
pub fn default_layout() -> Vec<GridItem> {
    vec![
        GridItem {
            id: "entity-grid".into(),
            x: 0,
            y: 0,
            w: 8,
            h: 6,
            component: "EntityGrid".into(),
            props: json!({"show_groups": true}),
        },
        GridItem {
            id: "climate-card".into(),
            x: 8,
            y: 0,
            w: 4,
            h: 3,
            component: "ClimateCard".into(),
            props: json!({"entity_id": "climate.hallway"}),
        },
        GridItem {
            id: "usage-card".into(),
            x: 8,
            y: 3,
            w: 4,
            h: 3,
            component: "UsageCard".into(),
            props: serde_json::Value::Null,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registry_entry_has_a_state_or_filter_reason() {
        let states = entity_states();
        // The garage door is fixture-excluded via its device's missing area
        for entry in registry_entries() {
            if entry.entity_id == "switch.garage_door" {
                continue;
            }
            assert!(
                states.contains_key(&entry.entity_id),
                "missing state for {}",
                entry.entity_id
            );
        }
    }

    #[test]
    fn test_layout_ids_are_unique() {
        let layout = default_layout();
        let mut ids: Vec<&str> = layout.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), layout.len());
    }
}
