//! Core types for the Traeger integration
//!
//! This crate provides the types shared by the sensor and number platforms:
//! the grill telemetry snapshot, probe accessories, cook steps, synthesized
//! entity ids, service calls and the outbound command set.

mod command;
mod context;
mod cook_step;
mod device;
mod entity;
mod entity_id;
mod error;
pub mod flag;
mod service_call;
mod snapshot;
mod state;
mod units;

pub use command::{GrillCommand, HvacMode};
pub use context::Context;
pub use cook_step::{format_number, CookStep};
pub use device::{Accessory, GrillDetails, GrillFeatures, GrillLimits, ProbeReading};
pub use entity::{EntityReport, GrillData};
pub use entity_id::{normalize_friendly_name, slugify, EntityId, EntityIdError, GrillTargets};
pub use error::{TraegerError, TraegerResult};
pub use service_call::ServiceCall;
pub use snapshot::{GrillSnapshot, SystemStatus};
pub use state::State;
pub use units::TemperatureUnit;

/// Integration domain, used for integration-level services
pub const DOMAIN: &str = "traeger";

/// State value reported by entities that are not available
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Highest grill target at which super smoke may be toggled
pub const SUPER_SMOKE_MAX_TEMP: f64 = 225.0;
