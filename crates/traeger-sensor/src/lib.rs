//! Sensor platform for Traeger grills
//!
//! Value sensors map snapshot fields straight to a state. The heating and
//! probe sensors run small classifiers that carry history between updates.

mod heating;
mod probe;
mod sensor;

pub use heating::{classify_heating, HeatingClassifierState, HeatingLabel};
pub use probe::{classify_probe, probe_available, ProbeClassifierState, ProbeLabel};
pub use sensor::{SensorEntity, SensorKind};
