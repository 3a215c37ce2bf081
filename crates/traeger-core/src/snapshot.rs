//! Grill telemetry snapshot

use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

/// Operating mode reported by the grill controller
///
/// The device reports numeric codes; codes this integration does not know
/// about are kept as `Unknown` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum SystemStatus {
    Sleeping,
    Idle,
    Igniting,
    Preheating,
    ManualCook,
    CustomCook,
    CoolDown,
    Shutdown,
    Offline,
    Unknown(u8),
}

impl SystemStatus {
    /// Modes in which temperature and alarm driven transitions are meaningful
    pub fn is_active_cooking(self) -> bool {
        matches!(
            self,
            Self::Igniting | Self::Preheating | Self::ManualCook | Self::CustomCook
        )
    }

    /// Igniting or preheating
    pub fn is_preheat(self) -> bool {
        matches!(self, Self::Igniting | Self::Preheating)
    }

    /// Holding a target temperature
    pub fn is_cook(self) -> bool {
        matches!(self, Self::ManualCook | Self::CustomCook)
    }

    /// Modes that end a running cook cycle
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            Self::CoolDown | Self::Sleeping | Self::Shutdown | Self::Idle
        )
    }

    /// Label shown by the grill state sensor
    pub fn label(self) -> &'static str {
        match self {
            Self::CoolDown => "cool_down",
            Self::CustomCook => "cook_custom",
            Self::ManualCook => "cook_manual",
            Self::Preheating => "preheating",
            Self::Igniting => "igniting",
            Self::Idle => "idle",
            Self::Sleeping => "sleeping",
            Self::Offline => "offline",
            Self::Shutdown => "shutdown",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for SystemStatus {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::Sleeping,
            3 => Self::Idle,
            4 => Self::Igniting,
            5 => Self::Preheating,
            6 => Self::ManualCook,
            7 => Self::CustomCook,
            8 => Self::CoolDown,
            9 => Self::Shutdown,
            99 => Self::Offline,
            other => Self::Unknown(other),
        }
    }
}

impl From<SystemStatus> for u8 {
    fn from(status: SystemStatus) -> u8 {
        match status {
            SystemStatus::Sleeping => 2,
            SystemStatus::Idle => 3,
            SystemStatus::Igniting => 4,
            SystemStatus::Preheating => 5,
            SystemStatus::ManualCook => 6,
            SystemStatus::CustomCook => 7,
            SystemStatus::CoolDown => 8,
            SystemStatus::Shutdown => 9,
            SystemStatus::Offline => 99,
            SystemStatus::Unknown(code) => code,
        }
    }
}

fn connected_default() -> bool {
    true
}

/// One telemetry update describing the physical state of a grill
///
/// Field names follow the grill's status payload so recorded telemetry can be
/// deserialized directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrillSnapshot {
    pub system_status: SystemStatus,

    /// Current grill temperature
    #[serde(default)]
    pub grill: f64,

    /// Target grill temperature
    #[serde(default)]
    pub set: f64,

    /// Probe temperature
    #[serde(default)]
    pub probe: f64,

    #[serde(default)]
    pub ambient: f64,

    /// Pellet level in percent
    #[serde(default)]
    pub pellet_level: f64,

    /// Cook timer start, epoch seconds
    #[serde(default)]
    pub cook_timer_start: i64,

    /// Cook timer end, epoch seconds
    #[serde(default)]
    pub cook_timer_end: i64,

    #[serde(default, with = "crate::flag")]
    pub cook_timer_complete: bool,

    #[serde(default, with = "crate::flag")]
    pub probe_alarm_fired: bool,

    #[serde(default, with = "crate::flag")]
    pub smoke: bool,

    #[serde(default, with = "crate::flag")]
    pub keepwarm: bool,

    #[serde(default = "connected_default")]
    pub connected: bool,

    #[serde(default)]
    pub units: TemperatureUnit,
}

impl GrillSnapshot {
    /// Create a connected snapshot with every reading zeroed
    pub fn new(system_status: SystemStatus, units: TemperatureUnit) -> Self {
        Self {
            system_status,
            grill: 0.0,
            set: 0.0,
            probe: 0.0,
            ambient: 0.0,
            pellet_level: 0.0,
            cook_timer_start: 0,
            cook_timer_end: 0,
            cook_timer_complete: false,
            probe_alarm_fired: false,
            smoke: false,
            keepwarm: false,
            connected: true,
            units,
        }
    }

    /// Set current and target grill temperature
    pub fn with_temps(mut self, grill: f64, set: f64) -> Self {
        self.grill = grill;
        self.set = set;
        self
    }

    /// Set the probe temperature
    pub fn with_probe(mut self, probe: f64) -> Self {
        self.probe = probe;
        self
    }

    /// Configured cook timer length in minutes
    pub fn cook_timer_minutes(&self) -> f64 {
        (self.cook_timer_end - self.cook_timer_start) as f64 / 60.0
    }
}
