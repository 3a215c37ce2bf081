//! Temperature unit of a grill and the thresholds that depend on it

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit system the grill reports temperatures in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "°C", alias = "C", alias = "celsius")]
    Celsius,
    #[default]
    #[serde(rename = "°F", alias = "F", alias = "fahrenheit")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Grill temperature below which a preheating grill is still "preheating"
    pub fn min_cook_temp(self) -> f64 {
        match self {
            Self::Celsius => 75.0,
            Self::Fahrenheit => 165.0,
        }
    }

    /// Band around the target in which the grill counts as at temperature
    pub fn heating_swing(self) -> f64 {
        match self {
            Self::Celsius => 11.0,
            Self::Fahrenheit => 20.0,
        }
    }

    /// Probe reading at or above which the probe is assumed out of the food
    pub fn probe_fell_out_temp(self) -> f64 {
        match self {
            Self::Celsius => 102.0,
            Self::Fahrenheit => 215.0,
        }
    }

    /// Distance from the probe target that counts as "close"
    pub fn probe_close_temp(self) -> f64 {
        match self {
            Self::Celsius => 3.0,
            Self::Fahrenheit => 5.0,
        }
    }

    /// Unit of measurement string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        let c: TemperatureUnit = serde_json::from_str("\"C\"").unwrap();
        let f: TemperatureUnit = serde_json::from_str("\"°F\"").unwrap();
        assert_eq!(c, TemperatureUnit::Celsius);
        assert_eq!(f, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_thresholds_switch_with_unit() {
        assert_eq!(TemperatureUnit::Celsius.probe_close_temp(), 3.0);
        assert_eq!(TemperatureUnit::Fahrenheit.probe_close_temp(), 5.0);
        assert_eq!(TemperatureUnit::Celsius.heating_swing(), 11.0);
        assert_eq!(TemperatureUnit::Fahrenheit.probe_fell_out_temp(), 215.0);
    }
}
