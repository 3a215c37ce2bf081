//! Probe state classifier with alarm latching

use serde::{Deserialize, Serialize};
use std::fmt;
use traeger_core::{Accessory, GrillSnapshot, ProbeReading};

/// Label published by a probe state sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeLabel {
    #[default]
    Idle,
    /// A target is set and the probe is still well below it
    Set,
    /// Within the close threshold of the target
    Close,
    /// The probe alarm fired and is latched
    AtTemp,
    /// Reading too hot to be inside food
    FellOut,
}

impl ProbeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Set => "set",
            Self::Close => "close",
            Self::AtTemp => "at_temp",
            Self::FellOut => "fell_out",
        }
    }
}

impl fmt::Display for ProbeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carried between evaluations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeClassifierState {
    pub previous_target: Option<f64>,
    pub alarm_latched: bool,
}

/// Whether the probe entity is available
///
/// Unavailable when the grill is gone or disconnected, or the accessory is
/// missing or reports itself disconnected.
pub fn probe_available(accessory: Option<&Accessory>, snapshot: Option<&GrillSnapshot>) -> bool {
    match (accessory, snapshot) {
        (Some(accessory), Some(snapshot)) => snapshot.connected && accessory.con,
        _ => false,
    }
}

/// Update the alarm latch for this reading
fn next_latch(reading: &ProbeReading, snapshot: &GrillSnapshot, prev: ProbeClassifierState) -> bool {
    let target_changed = prev.previous_target != Some(reading.set_temp);
    match reading.alarm_fired {
        None => false,
        Some(true) => true,
        Some(false)
            if (target_changed && reading.set_temp != 0.0)
                || !snapshot.system_status.is_active_cooking() =>
        {
            false
        }
        Some(false) => prev.alarm_latched,
    }
}

/// Classify one probe reading given the previous evaluation
pub fn classify_probe(
    reading: &ProbeReading,
    snapshot: &GrillSnapshot,
    prev: ProbeClassifierState,
) -> (ProbeLabel, ProbeClassifierState) {
    let units = snapshot.units;
    let target = reading.set_temp;
    let mut latched = next_latch(reading, snapshot, prev);

    let label = if reading.get_temp >= units.probe_fell_out_temp() {
        ProbeLabel::FellOut
    } else if latched {
        ProbeLabel::AtTemp
    } else if target != 0.0 && snapshot.system_status.is_active_cooking() {
        if reading.get_temp + units.probe_close_temp() >= target {
            ProbeLabel::Close
        } else {
            ProbeLabel::Set
        }
    } else {
        latched = false;
        ProbeLabel::Idle
    };

    (
        label,
        ProbeClassifierState {
            previous_target: Some(target),
            alarm_latched: latched,
        },
    )
}
