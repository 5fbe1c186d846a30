//! Presentation derivation for the dashboard
//!
//! This crate turns the entity directory and the persisted user
//! preferences into what the rendering grid consumes:
//! - usage counters, incremented on every toggle (UsageTracker)
//! - grouping views over the directory, selected by mode (GroupingEngine)
//! - the merged grid layout, saved geometry over defaults (LayoutEngine)
//!
//! All derivations are pure recompute-on-read; the persisted caches are
//! restored once at startup and written through on every mutation.

pub mod grouping;
pub mod layout;
pub mod usage;

pub use grouping::{EntityGroup, GroupingEngine, GroupingMode};
pub use layout::{GridItem, LayoutEngine, SavedLayoutItem};
pub use usage::UsageTracker;
