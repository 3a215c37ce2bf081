//! Static grill description and accessory payloads

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of a grill as listed by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrillDetails {
    /// Device id ("thingName")
    #[serde(rename = "thingName")]
    pub thing_name: String,

    #[serde(rename = "friendlyName")]
    pub friendly_name: String,
}

/// Limits of the grill model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrillLimits {
    pub max_grill_temp: f64,
}

/// Optional hardware features of the grill model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrillFeatures {
    #[serde(default, with = "crate::flag")]
    pub super_smoke_enabled: bool,

    #[serde(default, with = "crate::flag")]
    pub pellet_sensor_connected: bool,
}

/// Reading of a temperature probe accessory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeReading {
    /// Current probe temperature
    pub get_temp: f64,

    /// Probe target, 0 when unset
    #[serde(default)]
    pub set_temp: f64,

    /// Absent on probes without alarm capability
    #[serde(
        default,
        with = "crate::flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub alarm_fired: Option<bool>,
}

/// An accessory attached to the grill
///
/// The reading is stored under a key named by the accessory type, so the
/// payload is kept as raw JSON and decoded on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub uuid: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(with = "crate::flag")]
    pub con: bool,

    #[serde(flatten)]
    pub payload: HashMap<String, serde_json::Value>,
}

impl Accessory {
    /// Build a connected probe accessory
    pub fn probe(uuid: impl Into<String>, reading: ProbeReading) -> Self {
        let mut payload = HashMap::new();
        payload.insert(
            "probe".to_string(),
            serde_json::to_value(reading).unwrap_or_default(),
        );
        Self {
            uuid: uuid.into(),
            kind: "probe".to_string(),
            con: true,
            payload,
        }
    }

    /// Decode the reading stored under the accessory type
    pub fn reading(&self) -> Option<ProbeReading> {
        self.payload
            .get(&self.kind)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessory_reading_by_type() {
        let acc: Accessory = serde_json::from_value(json!({
            "uuid": "p0",
            "channel": "p0",
            "type": "probe",
            "con": 1,
            "probe": {"get_temp": 150, "set_temp": 165, "alarm_fired": 0}
        }))
        .unwrap();

        assert!(acc.con);
        let reading = acc.reading().unwrap();
        assert_eq!(reading.get_temp, 150.0);
        assert_eq!(reading.set_temp, 165.0);
        assert_eq!(reading.alarm_fired, Some(false));
    }

    #[test]
    fn test_reading_without_alarm_field() {
        let acc: Accessory = serde_json::from_value(json!({
            "uuid": "p1",
            "type": "probe",
            "con": true,
            "probe": {"get_temp": 70, "set_temp": 0}
        }))
        .unwrap();

        assert_eq!(acc.reading().unwrap().alarm_fired, None);
    }

    #[test]
    fn test_features_from_flags() {
        let features: GrillFeatures =
            serde_json::from_value(json!({"super_smoke_enabled": 1})).unwrap();
        assert!(features.super_smoke_enabled);
        assert!(!features.pellet_sensor_connected);
    }
}
