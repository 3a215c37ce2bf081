//! Published entity states
//!
//! Keeps the last state each entity published and broadcasts a
//! [`StateChanged`] for every write, so the replay binary and tests can
//! observe what the platform reports.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace};
use traeger_core::{Context, EntityId, EntityReport, State};

const DEFAULT_CAPACITY: usize = 1024;

/// Fired on every state write
#[derive(Debug, Clone)]
pub struct StateChanged {
    pub entity_id: EntityId,
    pub old_state: Option<State>,
    pub new_state: State,
}

pub struct StateStore {
    /// Entity states keyed by entity_id string
    states: DashMap<String, State>,
    sender: broadcast::Sender<StateChanged>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store whose broadcast channel holds `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            states: DashMap::new(),
            sender,
        }
    }

    /// Set the state of an entity
    ///
    /// `last_changed` is only bumped when the state value actually changed.
    #[instrument(skip(self, state, attributes, context), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: Map<String, Value>,
        context: Context,
    ) -> State {
        let key = entity_id.to_string();
        let old_state = self.states.get(&key).map(|s| s.clone());

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes, context),
            None => State::new(entity_id.clone(), state, attributes, context),
        };

        debug!(
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(key, new_state.clone());

        // No receivers is fine
        let _ = self.sender.send(StateChanged {
            entity_id,
            old_state,
            new_state: new_state.clone(),
        });

        new_state
    }

    /// Publish an entity evaluation
    pub fn publish(&self, report: &EntityReport, context: Context) -> State {
        trace!(entity_id = %report.entity_id, value = %report.value, "Publishing report");
        self.set(
            report.entity_id.clone(),
            report.state_value(),
            report.attributes(),
            context,
        )
    }

    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// State value, or None if the entity never published
    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    /// All states, sorted by entity id
    pub fn all(&self) -> Vec<State> {
        let mut states: Vec<State> = self.states.iter().map(|r| r.value().clone()).collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        states
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.sender.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for StateStore
pub type SharedStateStore = Arc<StateStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> EntityId {
        raw.parse().unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let store = StateStore::new();
        store.set(id("sensor.abc_heating_state"), "heating", Map::new(), Context::new());

        assert_eq!(
            store.get_state("sensor.abc_heating_state").as_deref(),
            Some("heating")
        );
        assert!(store.get("sensor.missing").is_none());
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_last_changed_kept_for_same_value() {
        let store = StateStore::new();
        let first = store.set(id("sensor.abc_grill_state"), "idle", Map::new(), Context::new());
        let second = store.set(id("sensor.abc_grill_state"), "idle", Map::new(), Context::new());
        assert_eq!(first.last_changed, second.last_changed);

        let third = store.set(
            id("sensor.abc_grill_state"),
            "cook_manual",
            Map::new(),
            Context::new(),
        );
        assert!(third.last_changed >= second.last_changed);
        assert_eq!(third.state, "cook_manual");
    }

    #[tokio::test]
    async fn test_broadcasts_changes() {
        let store = StateStore::new();
        let mut rx = store.subscribe();

        let mut attributes = Map::new();
        attributes.insert("icon".to_string(), json!("mdi:fire"));
        store.set(id("sensor.abc_heating_state"), "heating", attributes, Context::new());
        store.set(id("sensor.abc_heating_state"), "at_temp", Map::new(), Context::new());

        let first = rx.recv().await.unwrap();
        assert!(first.old_state.is_none());
        assert_eq!(first.new_state.attributes["icon"], json!("mdi:fire"));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.old_state.unwrap().state, "heating");
        assert_eq!(second.new_state.state, "at_temp");
    }

    #[test]
    fn test_publish_unavailable_report() {
        let store = StateStore::new();
        let report = EntityReport {
            entity_id: id("sensor.abc_ambient"),
            unique_id: "abc_ambient".to_string(),
            name: "abc Ambient Temperature".to_string(),
            icon: "mdi:thermometer",
            unit: Some("°F".to_string()),
            available: false,
            value: "70".to_string(),
            extra: Map::new(),
        };
        let state = store.publish(&report, Context::new());
        assert_eq!(state.state, traeger_core::STATE_UNAVAILABLE);
        assert_eq!(state.attributes["unit_of_measurement"], json!("°F"));
    }

    #[test]
    fn test_all_sorted() {
        let store = StateStore::new();
        store.set(id("sensor.b"), "1", Map::new(), Context::new());
        store.set(id("number.a"), "2", Map::new(), Context::new());
        let ids: Vec<String> = store.all().iter().map(|s| s.entity_id.to_string()).collect();
        assert_eq!(ids, vec!["number.a", "sensor.b"]);
    }
}
