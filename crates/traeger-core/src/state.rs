//! Published entity state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Context, EntityId};

/// The value an entity publishes after an evaluation
///
/// The state value is always a string, as in Home Assistant: numbers are
/// formatted, unavailable entities report "unavailable".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub entity_id: EntityId,

    pub state: String,

    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,

    /// When the state value last differed from the previous one
    pub last_changed: DateTime<Utc>,

    /// When the state was last written
    pub last_updated: DateTime<Utc>,

    pub context: Context,
}

impl State {
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: serde_json::Map<String, serde_json::Value>,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
            context,
        }
    }

    /// Create an updated state, preserving last_changed if the value is the same
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: serde_json::Map<String, serde_json::Value>,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let last_changed = if self.state != new_state {
            now
        } else {
            self.last_changed
        };

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed,
            last_updated: now,
            context,
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps and context are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity() -> EntityId {
        "sensor.abc_heating_state".parse().unwrap()
    }

    #[test]
    fn test_update_keeps_last_changed_for_same_value() {
        let first = State::new(entity(), "heating", Default::default(), Context::new());
        let second = first.with_update("heating", Default::default(), Context::new());
        assert_eq!(second.last_changed, first.last_changed);

        let third = second.with_update("at_temp", Default::default(), Context::new());
        assert!(third.last_changed >= second.last_changed);
        assert_eq!(third.state, "at_temp");
    }

    #[test]
    fn test_attribute_lookup() {
        let mut attrs = serde_json::Map::new();
        attrs.insert("icon".to_string(), json!("mdi:fire"));
        let state = State::new(entity(), "idle", attrs, Context::new());
        assert_eq!(state.attributes["icon"], json!("mdi:fire"));
    }
}
