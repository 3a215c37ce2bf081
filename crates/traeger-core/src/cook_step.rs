//! Cook step records supplied through the `set_custom_cook` service

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One phase of an operator-defined cook
///
/// Every key is optional; a step only carries what matters for its phase.
/// Keys the integration does not know are kept in `extra` so they still show
/// up in the diagnostics attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookStep {
    /// Cook timer length in seconds, set on entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_set: Option<f64>,

    /// Grill target set on entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_temp: Option<f64>,

    /// Probe target set on entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_set_temp: Option<f64>,

    /// Advance once the grill is above this temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_temp_adv: Option<f64>,

    /// Advance once the probe is above this temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_act_temp_adv: Option<f64>,

    /// Probe distance below the grill target that triggers a +5 raise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delta: Option<f64>,

    /// Ceiling for the +5 raises
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_grill_delta_temp: Option<f64>,

    #[serde(
        default,
        with = "crate::flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub smoke: Option<bool>,

    #[serde(
        default,
        with = "crate::flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub keepwarm: Option<bool>,

    /// When present, only the cook timer can advance this step
    #[serde(
        default,
        with = "crate::flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_timer: Option<bool>,

    #[serde(
        default,
        with = "crate::flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shutdown: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CookStep {
    /// Both keys of the probe-follow rule are present
    pub fn probe_follow(&self) -> Option<(f64, f64)> {
        self.min_delta.zip(self.max_grill_delta_temp)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown == Some(true)
    }
}

/// Format a number for display, dropping a zero fraction
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for CookStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers = [
            ("time_set", self.time_set),
            ("set_temp", self.set_temp),
            ("probe_set_temp", self.probe_set_temp),
            ("act_temp_adv", self.act_temp_adv),
            ("probe_act_temp_adv", self.probe_act_temp_adv),
            ("min_delta", self.min_delta),
            ("max_grill_delta_temp", self.max_grill_delta_temp),
        ];
        let flags = [
            ("smoke", self.smoke),
            ("keepwarm", self.keepwarm),
            ("shutdown", self.shutdown),
        ];

        let mut parts: Vec<String> = numbers
            .iter()
            .filter_map(|(k, v)| v.map(|v| format!("{}: {}", k, format_number(v))))
            .collect();
        parts.extend(
            flags
                .iter()
                .filter_map(|(k, v)| v.map(|v| format!("{}: {}", k, u8::from(v)))),
        );
        if let Some(use_timer) = self.use_timer {
            parts.push(format!("use_timer: {}", use_timer));
        }
        parts.extend(self.extra.iter().map(|(k, v)| format!("{}: {}", k, v)));

        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_step() {
        let step: CookStep = serde_json::from_value(json!({"set_temp": 225, "shutdown": 1})).unwrap();
        assert_eq!(step.set_temp, Some(225.0));
        assert!(step.is_shutdown());
        assert_eq!(step.time_set, None);
        assert!(step.probe_follow().is_none());
    }

    #[test]
    fn test_flags_accept_bools() {
        let step: CookStep =
            serde_json::from_value(json!({"smoke": true, "use_timer": false})).unwrap();
        assert_eq!(step.smoke, Some(true));
        assert_eq!(step.use_timer, Some(false));
    }

    #[test]
    fn test_display_summary() {
        let step: CookStep = serde_json::from_value(json!({
            "time_set": 600,
            "min_delta": 2.5,
            "smoke": 1,
            "note": "wrap"
        }))
        .unwrap();
        assert_eq!(
            step.to_string(),
            "{time_set: 600, min_delta: 2.5, smoke: 1, note: \"wrap\"}"
        );
        assert_eq!(CookStep::default().to_string(), "{}");
    }

    #[test]
    fn test_probe_follow() {
        let step: CookStep =
            serde_json::from_value(json!({"min_delta": 10, "max_grill_delta_temp": 275})).unwrap();
        assert_eq!(step.probe_follow(), Some((10.0, 275.0)));
    }
}
