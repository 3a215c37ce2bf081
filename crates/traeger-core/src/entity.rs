//! What an entity reads on evaluation and what it publishes afterwards

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::{
    Accessory, EntityId, GrillDetails, GrillFeatures, GrillLimits, GrillSnapshot,
    TemperatureUnit, STATE_UNAVAILABLE,
};

/// Everything the client knows about one grill at the moment of an update
#[derive(Debug, Clone, Default)]
pub struct GrillData {
    pub grill_id: String,
    pub details: Option<GrillDetails>,
    pub snapshot: Option<GrillSnapshot>,
    pub limits: Option<GrillLimits>,
    pub features: Option<GrillFeatures>,
    /// Accessories keyed by sensor id
    pub accessories: BTreeMap<String, Accessory>,
}

impl GrillData {
    pub fn new(grill_id: impl Into<String>) -> Self {
        Self {
            grill_id: grill_id.into(),
            ..Default::default()
        }
    }

    /// A snapshot exists and the grill reports itself connected
    pub fn available(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.connected)
    }

    pub fn units(&self) -> TemperatureUnit {
        self.snapshot.as_ref().map(|s| s.units).unwrap_or_default()
    }

    pub fn accessory(&self, sensor_id: &str) -> Option<&Accessory> {
        self.accessories.get(sensor_id)
    }

    /// `"<friendly name> <label>"`, falling back to the grill id
    pub fn display_name(&self, label: &str) -> String {
        match &self.details {
            Some(details) => format!("{} {}", details.friendly_name, label),
            None => format!("{} {}", self.grill_id, label),
        }
    }
}

/// Result of evaluating one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    pub entity_id: EntityId,
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    pub unit: Option<String>,
    pub available: bool,
    pub value: String,
    /// Entity specific attributes (number ranges, cook cycle diagnostics)
    pub extra: Map<String, Value>,
}

impl EntityReport {
    /// State string to publish
    pub fn state_value(&self) -> &str {
        if self.available {
            &self.value
        } else {
            STATE_UNAVAILABLE
        }
    }

    /// Standard attributes merged with the entity specific ones
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = self.extra.clone();
        attributes.insert("friendly_name".to_string(), json!(self.name));
        attributes.insert("icon".to_string(), json!(self.icon));
        if let Some(unit) = &self.unit {
            attributes.insert("unit_of_measurement".to_string(), json!(unit));
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemStatus;

    #[test]
    fn test_display_name_fallback() {
        let mut data = GrillData::new("abc123");
        assert_eq!(data.display_name("Heating State"), "abc123 Heating State");

        data.details = Some(GrillDetails {
            thing_name: "abc123".to_string(),
            friendly_name: "Backyard".to_string(),
        });
        assert_eq!(data.display_name("Heating State"), "Backyard Heating State");
    }

    #[test]
    fn test_available_requires_connected_snapshot() {
        let mut data = GrillData::new("abc123");
        assert!(!data.available());

        let mut snapshot = GrillSnapshot::new(SystemStatus::Idle, TemperatureUnit::Celsius);
        snapshot.connected = false;
        data.snapshot = Some(snapshot);
        assert!(!data.available());
        assert_eq!(data.units(), TemperatureUnit::Celsius);
    }

    #[test]
    fn test_unavailable_report_value() {
        let report = EntityReport {
            entity_id: "sensor.abc_grill_state".parse().unwrap(),
            unique_id: "abc_grill_state".to_string(),
            name: "abc Grill State".to_string(),
            icon: "mdi:grill",
            unit: None,
            available: false,
            value: "idle".to_string(),
            extra: Map::new(),
        };
        assert_eq!(report.state_value(), STATE_UNAVAILABLE);
        assert_eq!(report.attributes()["icon"], json!("mdi:grill"));
    }
}
