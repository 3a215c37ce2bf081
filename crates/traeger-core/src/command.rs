//! Outbound commands issued by the cook cycle

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::{Context, EntityId, ServiceCall, DOMAIN};

/// HVAC mode requested from the grill climate entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Heat,
    Cool,
    Off,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Off => "off",
        }
    }
}

/// A side effect requested by an evaluation
///
/// Evaluations only describe what should happen; a dispatcher lowers each
/// command to a [`ServiceCall`] and executes it without awaiting the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum GrillCommand {
    /// `climate.set_temperature`
    SetTemperature { entity_id: EntityId, temperature: i64 },

    /// `traeger.set_timer` on the cook timer number, exact seconds
    SetTimer { entity_id: EntityId, seconds: i64 },

    /// `switch.turn_on` / `switch.turn_off`
    Switch { entity_id: EntityId, on: bool },

    /// `climate.set_hvac_mode`
    SetHvacMode { entity_id: EntityId, hvac_mode: HvacMode },
}

impl GrillCommand {
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::SetTemperature { entity_id, .. }
            | Self::SetTimer { entity_id, .. }
            | Self::Switch { entity_id, .. }
            | Self::SetHvacMode { entity_id, .. } => entity_id,
        }
    }

    /// Lower to the service call the host understands
    pub fn to_service_call(&self, context: Context) -> ServiceCall {
        let entity_id = self.entity_id().to_string();
        match self {
            Self::SetTemperature { temperature, .. } => ServiceCall::new(
                "climate",
                "set_temperature",
                json!({"entity_id": entity_id, "temperature": temperature}),
                context,
            ),
            Self::SetTimer { seconds, .. } => ServiceCall::new(
                DOMAIN,
                "set_timer",
                json!({"entity_id": entity_id, "seconds": seconds}),
                context,
            ),
            Self::Switch { on, .. } => ServiceCall::new(
                "switch",
                if *on { "turn_on" } else { "turn_off" },
                json!({"entity_id": entity_id}),
                context,
            ),
            Self::SetHvacMode { hvac_mode, .. } => ServiceCall::new(
                "climate",
                "set_hvac_mode",
                json!({"entity_id": entity_id, "hvac_mode": hvac_mode.as_str()}),
                context,
            ),
        }
    }
}

impl fmt::Display for GrillCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetTemperature {
                entity_id,
                temperature,
            } => write!(f, "set {} to {}", entity_id, temperature),
            Self::SetTimer { entity_id, seconds } => {
                write!(f, "set {} to {} s", entity_id, seconds)
            }
            Self::Switch { entity_id, on } => {
                write!(f, "turn {} {}", if *on { "on" } else { "off" }, entity_id)
            }
            Self::SetHvacMode {
                entity_id,
                hvac_mode,
            } => write!(f, "set {} hvac mode {}", entity_id, hvac_mode.as_str()),
        }
    }
}
