//! Sensor entities exposed per grill

use serde_json::Map;
use tracing::debug;
use traeger_core::{format_number, EntityId, EntityIdError, EntityReport, GrillData};

use crate::heating::{classify_heating, HeatingClassifierState};
use crate::probe::{classify_probe, probe_available, ProbeClassifierState, ProbeLabel};

/// The closed set of sensors this platform provides
#[derive(Debug, Clone, PartialEq)]
pub enum SensorKind {
    PelletLevel,
    Ambient,
    CookTimerStart,
    CookTimerEnd,
    GrillState,
    HeatingState(HeatingClassifierState),
    ProbeState {
        sensor_id: String,
        state: ProbeClassifierState,
    },
}

impl SensorKind {
    /// Key used for unique ids and entity ids
    pub fn key(&self) -> String {
        match self {
            Self::PelletLevel => "pellet_level".to_string(),
            Self::Ambient => "ambient".to_string(),
            Self::CookTimerStart => "cook_timer_start".to_string(),
            Self::CookTimerEnd => "cook_timer_end".to_string(),
            Self::GrillState => "grill_state".to_string(),
            Self::HeatingState(_) => "heating_state".to_string(),
            Self::ProbeState { sensor_id, .. } => format!("probe_state_{}", sensor_id),
        }
    }

    /// Human label appended to the grill name
    pub fn label(&self) -> String {
        match self {
            Self::PelletLevel => "Pellet Level".to_string(),
            Self::Ambient => "Ambient Temperature".to_string(),
            Self::CookTimerStart => "Cook Timer Start".to_string(),
            Self::CookTimerEnd => "Cook Timer End".to_string(),
            Self::GrillState => "Grill State".to_string(),
            Self::HeatingState(_) => "Heating State".to_string(),
            Self::ProbeState { sensor_id, .. } => format!("Probe State {}", sensor_id),
        }
    }
}

/// A sensor bound to one grill
#[derive(Debug, Clone)]
pub struct SensorEntity {
    grill_id: String,
    entity_id: EntityId,
    kind: SensorKind,
}

impl SensorEntity {
    pub fn new(grill_id: impl Into<String>, kind: SensorKind) -> Result<Self, EntityIdError> {
        let grill_id = grill_id.into();
        let entity_id = EntityId::for_grill("sensor", &grill_id, &kind.key())?;
        Ok(Self {
            grill_id,
            entity_id,
            kind,
        })
    }

    /// The standard set of sensors every grill gets
    pub fn standard_set(grill_id: &str) -> Result<Vec<Self>, EntityIdError> {
        [
            SensorKind::PelletLevel,
            SensorKind::Ambient,
            SensorKind::CookTimerStart,
            SensorKind::CookTimerEnd,
            SensorKind::GrillState,
            SensorKind::HeatingState(HeatingClassifierState::default()),
        ]
        .into_iter()
        .map(|kind| Self::new(grill_id, kind))
        .collect()
    }

    /// Probe state sensor for one accessory
    pub fn probe(grill_id: &str, sensor_id: impl Into<String>) -> Result<Self, EntityIdError> {
        Self::new(
            grill_id,
            SensorKind::ProbeState {
                sensor_id: sensor_id.into(),
                state: ProbeClassifierState::default(),
            },
        )
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn kind(&self) -> &SensorKind {
        &self.kind
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.grill_id, self.kind.key())
    }

    /// Recompute the sensor from the latest grill data
    pub fn evaluate(&mut self, data: &GrillData) -> EntityReport {
        let name = data.display_name(&self.kind.label());
        let unique_id = self.unique_id();
        let snapshot = data.snapshot.as_ref();
        let units = data.units();

        let (value, icon, unit, available) = match &mut self.kind {
            SensorKind::PelletLevel => (
                snapshot.map(|s| format_number(s.pellet_level)),
                "mdi:gauge",
                Some("%".to_string()),
                data.features.is_some_and(|f| f.pellet_sensor_connected),
            ),
            SensorKind::Ambient => (
                snapshot.map(|s| format_number(s.ambient)),
                "mdi:thermometer",
                Some(units.as_str().to_string()),
                data.available(),
            ),
            SensorKind::CookTimerStart => (
                snapshot.map(|s| s.cook_timer_start.to_string()),
                "mdi:timer",
                Some("sec".to_string()),
                data.available(),
            ),
            SensorKind::CookTimerEnd => (
                snapshot.map(|s| s.cook_timer_end.to_string()),
                "mdi:timer",
                Some("sec".to_string()),
                data.available(),
            ),
            SensorKind::GrillState => (
                snapshot.map(|s| s.system_status.label().to_string()),
                "mdi:grill",
                None,
                data.available(),
            ),
            SensorKind::HeatingState(state) => {
                let (label, next) = classify_heating(snapshot, *state);
                *state = next;
                (
                    Some(label.to_string()),
                    label.icon(),
                    None,
                    data.available(),
                )
            }
            SensorKind::ProbeState { sensor_id, state } => {
                let accessory = data.accessory(sensor_id);
                let available = probe_available(accessory, snapshot);
                let reading = accessory.and_then(|a| a.reading());

                let label = match (reading, snapshot) {
                    (Some(reading), Some(snapshot)) if available => {
                        let (label, next) = classify_probe(&reading, snapshot, *state);
                        *state = next;
                        label
                    }
                    _ => {
                        if state.alarm_latched {
                            debug!(sensor_id = %sensor_id, "Probe unavailable, releasing alarm latch");
                        }
                        *state = ProbeClassifierState::default();
                        ProbeLabel::Idle
                    }
                };
                (
                    Some(label.to_string()),
                    "mdi:thermometer",
                    None,
                    available,
                )
            }
        };

        EntityReport {
            entity_id: self.entity_id.clone(),
            unique_id,
            name,
            icon,
            unit,
            available: available && value.is_some(),
            value: value.unwrap_or_default(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traeger_core::{
        Accessory, GrillDetails, GrillFeatures, GrillSnapshot, ProbeReading, SystemStatus,
        TemperatureUnit,
    };

    fn data_with(snapshot: GrillSnapshot) -> GrillData {
        let mut data = GrillData::new("abc123");
        data.details = Some(GrillDetails {
            thing_name: "abc123".to_string(),
            friendly_name: "Backyard".to_string(),
        });
        data.snapshot = Some(snapshot);
        data
    }

    #[test]
    fn test_standard_set_ids() {
        let sensors = SensorEntity::standard_set("abc123").unwrap();
        let ids: Vec<String> = sensors.iter().map(|s| s.entity_id().to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "sensor.abc123_pellet_level",
                "sensor.abc123_ambient",
                "sensor.abc123_cook_timer_start",
                "sensor.abc123_cook_timer_end",
                "sensor.abc123_grill_state",
                "sensor.abc123_heating_state",
            ]
        );
    }

    #[test]
    fn test_grill_state_labels() {
        let mut sensor = SensorEntity::new("abc123", SensorKind::GrillState).unwrap();
        let report = sensor.evaluate(&data_with(GrillSnapshot::new(
            SystemStatus::CustomCook,
            TemperatureUnit::Fahrenheit,
        )));
        assert_eq!(report.value, "cook_custom");
        assert_eq!(report.name, "Backyard Grill State");
        assert_eq!(report.unique_id, "abc123_grill_state");

        let report = sensor.evaluate(&data_with(GrillSnapshot::new(
            SystemStatus::Unknown(12),
            TemperatureUnit::Fahrenheit,
        )));
        assert_eq!(report.value, "unknown");
    }

    #[test]
    fn test_pellet_level_needs_sensor() {
        let mut sensor = SensorEntity::new("abc123", SensorKind::PelletLevel).unwrap();
        let mut snapshot = GrillSnapshot::new(SystemStatus::Idle, TemperatureUnit::Fahrenheit);
        snapshot.pellet_level = 80.0;
        let mut data = data_with(snapshot);

        assert!(!sensor.evaluate(&data).available);

        data.features = Some(GrillFeatures {
            super_smoke_enabled: false,
            pellet_sensor_connected: true,
        });
        let report = sensor.evaluate(&data);
        assert!(report.available);
        assert_eq!(report.state_value(), "80");
        assert_eq!(report.unit.as_deref(), Some("%"));
    }

    #[test]
    fn test_ambient_unit_follows_grill() {
        let mut sensor = SensorEntity::new("abc123", SensorKind::Ambient).unwrap();
        let mut snapshot = GrillSnapshot::new(SystemStatus::Idle, TemperatureUnit::Celsius);
        snapshot.ambient = 21.5;
        let report = sensor.evaluate(&data_with(snapshot));
        assert_eq!(report.value, "21.5");
        assert_eq!(report.unit.as_deref(), Some("°C"));
    }

    #[test]
    fn test_heating_state_carries_history() {
        let mut sensor = SensorEntity::new(
            "abc123",
            SensorKind::HeatingState(HeatingClassifierState::default()),
        )
        .unwrap();
        let cooking = |current| {
            data_with(
                GrillSnapshot::new(SystemStatus::ManualCook, TemperatureUnit::Fahrenheit)
                    .with_temps(current, 225.0),
            )
        };

        assert_eq!(sensor.evaluate(&cooking(150.0)).value, "heating");
        assert_eq!(sensor.evaluate(&cooking(226.0)).value, "at_temp");
        let report = sensor.evaluate(&cooking(250.0));
        assert_eq!(report.value, "over_temp");
        assert_eq!(report.icon, "mdi:fire-alert");
    }

    #[test]
    fn test_unavailable_grill_reports_unavailable() {
        let mut sensor = SensorEntity::new("abc123", SensorKind::GrillState).unwrap();
        let report = sensor.evaluate(&GrillData::new("abc123"));
        assert!(!report.available);
        assert_eq!(report.name, "abc123 Grill State");
    }

    #[test]
    fn test_probe_latch_released_on_disconnect() {
        let mut sensor = SensorEntity::probe("abc123", "p0").unwrap();
        let snapshot = GrillSnapshot::new(SystemStatus::ManualCook, TemperatureUnit::Fahrenheit);
        let fired = ProbeReading {
            get_temp: 165.0,
            set_temp: 165.0,
            alarm_fired: Some(true),
        };

        let mut data = data_with(snapshot);
        data.accessories
            .insert("p0".to_string(), Accessory::probe("p0", fired));
        let report = sensor.evaluate(&data);
        assert_eq!(report.value, "at_temp");
        assert_eq!(report.entity_id.to_string(), "sensor.abc123_probe_state_p0");

        data.accessories.get_mut("p0").unwrap().con = false;
        let report = sensor.evaluate(&data);
        assert!(!report.available);
        assert_eq!(report.value, "idle");
        match sensor.kind() {
            SensorKind::ProbeState { state, .. } => assert!(!state.alarm_latched),
            other => panic!("unexpected kind {:?}", other),
        }

        // Reconnected with the alarm cleared on the device: nothing latched
        data.accessories.insert(
            "p0".to_string(),
            Accessory::probe(
                "p0",
                ProbeReading {
                    alarm_fired: Some(false),
                    ..fired
                },
            ),
        );
        let report = sensor.evaluate(&data);
        assert_eq!(report.value, "close");

        data.accessories.remove("p0");
        let report = sensor.evaluate(&data);
        assert!(!report.available);
        assert_eq!(report.value, "idle");
    }
}
