//! Entity state with domain-tagged attributes
//!
//! Live state arrives from the push feed as a map of entity id to state
//! object. Attribute shapes differ per domain, so they are modeled as a
//! tagged variant keyed by the id's domain; domains without a typed shape
//! fall back to the raw attribute map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity_id::domain_of;

/// State value for an entity that is switched on
pub const STATE_ON: &str = "on";
/// State value for an entity that is switched off
pub const STATE_OFF: &str = "off";
/// State value for an entity whose integration is unreachable
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Live entity states keyed by entity id, replaced wholesale on every push
pub type EntityMap = HashMap<String, EntityState>;

/// Attributes of a light entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_color_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<u32>,
}

/// Attributes of a fan entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<u32>,
}

/// Attributes of a switch entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

/// Attributes of a climate entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hvac_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<u32>,
}

/// Per-domain entity attributes
///
/// The variant is selected from the entity id's domain when a state is
/// deserialized. Unknown domains, and typed shapes that fail to parse,
/// carry the raw attribute map instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityAttributes {
    Light(LightAttributes),
    Fan(FanAttributes),
    Switch(SwitchAttributes),
    Climate(ClimateAttributes),
    Base(Map<String, Value>),
}

impl EntityAttributes {
    /// Classify a raw attribute map by the owning entity's domain
    pub fn from_domain(domain: &str, raw: Map<String, Value>) -> Self {
        let value = Value::Object(raw);
        let typed = match domain {
            "light" => serde_json::from_value(value.clone()).map(Self::Light).ok(),
            "fan" => serde_json::from_value(value.clone()).map(Self::Fan).ok(),
            "switch" => serde_json::from_value(value.clone()).map(Self::Switch).ok(),
            "climate" => serde_json::from_value(value.clone()).map(Self::Climate).ok(),
            _ => None,
        };
        typed.unwrap_or_else(|| match value {
            Value::Object(map) => Self::Base(map),
            _ => Self::Base(Map::new()),
        })
    }

    /// Display name supplied by the integration, if any
    pub fn friendly_name(&self) -> Option<&str> {
        match self {
            Self::Light(a) => a.friendly_name.as_deref(),
            Self::Fan(a) => a.friendly_name.as_deref(),
            Self::Switch(a) => a.friendly_name.as_deref(),
            Self::Climate(a) => a.friendly_name.as_deref(),
            Self::Base(map) => map.get("friendly_name").and_then(Value::as_str),
        }
    }
}

impl Default for EntityAttributes {
    fn default() -> Self {
        Self::Base(Map::new())
    }
}

/// The state of a single entity at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct EntityState {
    /// Full entity id (`domain.object_id`)
    pub entity_id: String,

    /// The state value (e.g., "on", "off", "heat", "unavailable")
    pub state: String,

    /// Domain-tagged attributes
    pub attributes: EntityAttributes,

    /// When the state value last changed
    pub last_changed: DateTime<Utc>,

    /// When the state was last written, even if the value did not change
    pub last_updated: DateTime<Utc>,
}

impl EntityState {
    /// Create a new state with current timestamps
    pub fn new(
        entity_id: impl Into<String>,
        state: impl Into<String>,
        attributes: EntityAttributes,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
        }
    }

    /// The entity's domain, derived from its id
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    /// Whether the state value is `"on"`
    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }

    /// Whether the state value represents an unavailable entity
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// Produce an updated state, preserving `last_changed` when the value
    /// is unchanged
    pub fn with_state(&self, new_state: impl Into<String>) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let changed = self.state != new_state;

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: self.attributes.clone(),
            last_changed: if changed { now } else { self.last_changed },
            last_updated: now,
        }
    }

    /// Flip between `"on"` and `"off"`; any non-"on" value toggles to "on"
    pub fn toggled(&self) -> Self {
        if self.is_on() {
            self.with_state(STATE_OFF)
        } else {
            self.with_state(STATE_ON)
        }
    }
}

impl<'de> Deserialize<'de> for EntityState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct WireState {
            entity_id: String,
            state: String,
            #[serde(default)]
            attributes: Map<String, Value>,
            #[serde(default = "Utc::now")]
            last_changed: DateTime<Utc>,
            #[serde(default = "Utc::now")]
            last_updated: DateTime<Utc>,
        }

        let wire = WireState::deserialize(deserializer)?;
        let attributes = EntityAttributes::from_domain(domain_of(&wire.entity_id), wire.attributes);

        Ok(Self {
            entity_id: wire.entity_id,
            state: wire.state,
            attributes,
            last_changed: wire.last_changed,
            last_updated: wire.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_tagged_by_domain() {
        let state: EntityState = serde_json::from_value(json!({
            "entity_id": "light.lamp",
            "state": "on",
            "attributes": {"friendly_name": "Lamp", "brightness": 128}
        }))
        .unwrap();

        match &state.attributes {
            EntityAttributes::Light(a) => {
                assert_eq!(a.friendly_name.as_deref(), Some("Lamp"));
                assert_eq!(a.brightness, Some(128));
            }
            other => panic!("expected light attributes, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_domain_keeps_raw_attributes() {
        let state: EntityState = serde_json::from_value(json!({
            "entity_id": "weather.home",
            "state": "cloudy",
            "attributes": {"temperature": 21.5, "friendly_name": "Home"}
        }))
        .unwrap();

        match &state.attributes {
            EntityAttributes::Base(map) => assert_eq!(map["temperature"], json!(21.5)),
            other => panic!("expected base attributes, got {:?}", other),
        }
        assert_eq!(state.attributes.friendly_name(), Some("Home"));
    }

    #[test]
    fn test_malformed_typed_shape_falls_back_to_base() {
        // brightness as a string does not fit LightAttributes
        let state: EntityState = serde_json::from_value(json!({
            "entity_id": "light.lamp",
            "state": "on",
            "attributes": {"brightness": "high"}
        }))
        .unwrap();

        assert!(matches!(state.attributes, EntityAttributes::Base(_)));
    }

    #[test]
    fn test_toggle_flips_state() {
        let state = EntityState::new("switch.coffee", STATE_ON, EntityAttributes::default());
        let off = state.toggled();
        assert_eq!(off.state, STATE_OFF);
        assert_eq!(off.toggled().state, STATE_ON);
    }

    #[test]
    fn test_with_state_preserves_last_changed_when_unchanged() {
        let state = EntityState::new("light.lamp", STATE_ON, EntityAttributes::default());
        let same = state.with_state(STATE_ON);
        assert_eq!(same.last_changed, state.last_changed);

        let flipped = same.with_state(STATE_OFF);
        assert!(flipped.last_changed >= same.last_changed);
        assert_eq!(flipped.state, STATE_OFF);
    }

    #[test]
    fn test_missing_attributes_default_empty() {
        let state: EntityState = serde_json::from_value(json!({
            "entity_id": "fan.ceiling",
            "state": "off"
        }))
        .unwrap();

        assert_eq!(state.attributes, EntityAttributes::Fan(FanAttributes::default()));
        assert_eq!(state.domain(), "fan");
    }
}
