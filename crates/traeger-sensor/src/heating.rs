//! Heating state classifier
//!
//! Derives a coarse label from current vs. target grill temperature. While
//! cooking, the previous label decides which threshold ends the current
//! phase, so the label does not flap around the target:
//!
//! ```text
//! preheating/heating --(current >= target)--> at_temp
//! cooling            --(current <= target)--> at_temp
//! at_temp --(current > target+swing)--> over_temp --(current < target+swing)--> at_temp
//! at_temp --(current < target-swing)--> under_temp --(current > target-swing)--> at_temp
//! any    --(target changed)--> heating | cooling
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;
use traeger_core::{GrillSnapshot, SystemStatus};

/// Label published by the heating state sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatingLabel {
    #[default]
    Idle,
    Preheating,
    Heating,
    Cooling,
    AtTemp,
    UnderTemp,
    OverTemp,
    CoolDown,
}

impl HeatingLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preheating => "preheating",
            Self::Heating => "heating",
            Self::Cooling => "cooling",
            Self::AtTemp => "at_temp",
            Self::UnderTemp => "under_temp",
            Self::OverTemp => "over_temp",
            Self::CoolDown => "cool_down",
        }
    }

    pub fn icon(self) -> &'static str {
        if self == Self::OverTemp {
            "mdi:fire-alert"
        } else {
            "mdi:fire"
        }
    }
}

impl fmt::Display for HeatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carried between evaluations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeatingClassifierState {
    pub previous_label: HeatingLabel,
    pub previous_target: Option<f64>,
}

/// Classify one snapshot given the previous evaluation
///
/// `None` stands for an unavailable grill; it yields `Idle` and resets the
/// carried state.
pub fn classify_heating(
    snapshot: Option<&GrillSnapshot>,
    prev: HeatingClassifierState,
) -> (HeatingLabel, HeatingClassifierState) {
    let Some(snapshot) = snapshot.filter(|s| s.connected) else {
        return (HeatingLabel::Idle, HeatingClassifierState::default());
    };

    let target = snapshot.set;
    let current = snapshot.grill;
    let mode = snapshot.system_status;
    let swing = snapshot.units.heating_swing();
    let low = target - swing;
    let high = target + swing;
    let mut target_changed = prev.previous_target != Some(target);

    let label = if mode.is_preheat() {
        if current < snapshot.units.min_cook_temp() {
            HeatingLabel::Preheating
        } else {
            HeatingLabel::Heating
        }
    } else if mode.is_cook() {
        let held = match prev.previous_label {
            HeatingLabel::Heating | HeatingLabel::Preheating => Some(if current >= target {
                HeatingLabel::AtTemp
            } else {
                HeatingLabel::Heating
            }),
            HeatingLabel::Cooling => Some(if current <= target {
                HeatingLabel::AtTemp
            } else {
                HeatingLabel::Cooling
            }),
            HeatingLabel::AtTemp => Some(if current > high {
                HeatingLabel::OverTemp
            } else if current < low {
                HeatingLabel::UnderTemp
            } else {
                HeatingLabel::AtTemp
            }),
            HeatingLabel::UnderTemp => Some(if current > low {
                HeatingLabel::AtTemp
            } else {
                HeatingLabel::UnderTemp
            }),
            HeatingLabel::OverTemp => Some(if current < high {
                HeatingLabel::AtTemp
            } else {
                HeatingLabel::OverTemp
            }),
            // coming from idle/cool_down
            HeatingLabel::Idle | HeatingLabel::CoolDown => None,
        };

        match held {
            Some(label) if !target_changed => label,
            _ => {
                target_changed = true;
                if current <= target {
                    HeatingLabel::Heating
                } else {
                    HeatingLabel::Cooling
                }
            }
        }
    } else if mode == SystemStatus::CoolDown {
        HeatingLabel::CoolDown
    } else {
        HeatingLabel::Idle
    };

    trace!(%label, current, target, target_changed, "Classified heating state");

    (
        label,
        HeatingClassifierState {
            previous_label: label,
            previous_target: Some(target),
        },
    )
}
