//! Data sourcing and state reconciliation for the dashboard
//!
//! The [`Dashboard`] handle is the single entry point: it restores the
//! persisted layout, grouping mode and usage counters, then sources
//! entity state either from the built-in fixture snapshot (local mode)
//! or from a remote server over its websocket API (remote mode).
//!
//! Presentation stays derived: groups and the merged layout are
//! recomputed on every read from the live directory, the usage
//! counters and the saved geometry.

pub mod config;
pub mod connection;
pub mod fixtures;

mod dashboard;
mod error;
mod state;

pub use config::{ConfigError, ConfigResult, DashboardConfig, DataSource};
pub use connection::{Connection, EntityHandler};
pub use dashboard::Dashboard;
pub use error::ClientError;
pub use state::DashboardState;
