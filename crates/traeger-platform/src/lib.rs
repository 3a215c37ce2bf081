//! Traeger sensor and number platforms
//!
//! Binds the entities of `traeger-sensor` and `traeger-number` to a
//! [`GrillClient`], publishes their states and exposes the integration's
//! services.

mod client;
mod memory;
mod platform;

pub use client::{grill_data, GrillClient, UpdateCallback};
pub use memory::{MemoryGrillClient, TimerRequest};
pub use platform::TraegerPlatform;
