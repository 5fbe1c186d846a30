//! Core types for the home-automation dashboard
//!
//! This crate provides the fundamental types shared by the dashboard
//! components: domain parsing for entity ids, entity states with
//! domain-tagged attributes, device and entity registry entries, and the
//! directory builder that joins the registries into the list the
//! dashboard renders from.

mod entity_id;
mod registry;
mod state;

pub mod directory;

pub use entity_id::{domain_of, UNKNOWN_DOMAIN};
pub use registry::{Device, EntityWithRegistry, RegistryEntry};
pub use state::{
    ClimateAttributes, EntityAttributes, EntityMap, EntityState, FanAttributes, LightAttributes,
    SwitchAttributes, STATE_OFF, STATE_ON, STATE_UNAVAILABLE,
};
