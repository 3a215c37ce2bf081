//! In-memory grill client
//!
//! Holds telemetry pushed into it and fires the registered callbacks, the
//! way the cloud client does when an MQTT update lands. Used by the replay
//! binary and the platform tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};
use traeger_core::{
    Accessory, GrillDetails, GrillFeatures, GrillLimits, GrillSnapshot, TraegerError,
    TraegerResult,
};

use crate::client::{GrillClient, UpdateCallback};

/// Timer request received from an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    Set(i64),
    Reset,
}

#[derive(Debug, Clone)]
struct GrillRecord {
    details: GrillDetails,
    limits: Option<GrillLimits>,
    features: Option<GrillFeatures>,
    snapshot: Option<GrillSnapshot>,
    accessories: BTreeMap<String, Accessory>,
}

#[derive(Default)]
pub struct MemoryGrillClient {
    grills: DashMap<String, GrillRecord>,
    callbacks: DashMap<String, Vec<UpdateCallback>>,
    timer_requests: Mutex<Vec<(String, TimerRequest)>>,
}

impl MemoryGrillClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grill with no telemetry yet
    pub fn add_grill(
        &self,
        details: GrillDetails,
        limits: Option<GrillLimits>,
        features: Option<GrillFeatures>,
    ) {
        info!(grill_id = %details.thing_name, "Adding grill");
        self.grills.insert(
            details.thing_name.clone(),
            GrillRecord {
                details,
                limits,
                features,
                snapshot: None,
                accessories: BTreeMap::new(),
            },
        );
    }

    /// Store a snapshot and notify listeners
    pub fn push_snapshot(&self, grill_id: &str, snapshot: GrillSnapshot) -> TraegerResult<()> {
        self.update(grill_id, |record| record.snapshot = Some(snapshot))
    }

    /// Add or replace an accessory and notify listeners
    pub fn push_accessory(&self, grill_id: &str, accessory: Accessory) -> TraegerResult<()> {
        self.update(grill_id, |record| {
            record.accessories.insert(accessory.uuid.clone(), accessory);
        })
    }

    pub fn remove_accessory(&self, grill_id: &str, sensor_id: &str) -> TraegerResult<()> {
        self.update(grill_id, |record| {
            record.accessories.remove(sensor_id);
        })
    }

    /// Timer requests received so far, oldest first
    pub fn timer_requests(&self) -> Vec<(String, TimerRequest)> {
        self.timer_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn update(&self, grill_id: &str, apply: impl FnOnce(&mut GrillRecord)) -> TraegerResult<()> {
        {
            let mut record = self
                .grills
                .get_mut(grill_id)
                .ok_or_else(|| TraegerError::UnknownGrill(grill_id.to_string()))?;
            apply(record.value_mut());
        }
        self.notify(grill_id);
        Ok(())
    }

    fn notify(&self, grill_id: &str) {
        // Clone out so callbacks may call back into the client
        let callbacks = self
            .callbacks
            .get(grill_id)
            .map(|c| c.clone())
            .unwrap_or_default();
        debug!(grill_id, listeners = callbacks.len(), "Telemetry updated");
        for callback in callbacks {
            callback();
        }
    }

    fn record_timer(&self, grill_id: &str, request: TimerRequest) -> TraegerResult<()> {
        if !self.grills.contains_key(grill_id) {
            return Err(TraegerError::UnknownGrill(grill_id.to_string()));
        }
        info!(grill_id, ?request, "Timer request");
        self.timer_requests
            .lock()
            .map_err(|_| TraegerError::Client("timer log poisoned".to_string()))?
            .push((grill_id.to_string(), request));
        Ok(())
    }
}

#[async_trait]
impl GrillClient for MemoryGrillClient {
    fn grills(&self) -> Vec<GrillDetails> {
        let mut grills: Vec<GrillDetails> =
            self.grills.iter().map(|r| r.details.clone()).collect();
        grills.sort_by(|a, b| a.thing_name.cmp(&b.thing_name));
        grills
    }

    fn grill_details(&self, grill_id: &str) -> Option<GrillDetails> {
        self.grills.get(grill_id).map(|r| r.details.clone())
    }

    fn grill_state(&self, grill_id: &str) -> Option<GrillSnapshot> {
        self.grills.get(grill_id).and_then(|r| r.snapshot.clone())
    }

    fn grill_limits(&self, grill_id: &str) -> Option<GrillLimits> {
        self.grills.get(grill_id).and_then(|r| r.limits)
    }

    fn grill_features(&self, grill_id: &str) -> Option<GrillFeatures> {
        self.grills.get(grill_id).and_then(|r| r.features)
    }

    fn accessory_ids(&self, grill_id: &str) -> Vec<String> {
        self.grills
            .get(grill_id)
            .map(|r| r.accessories.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn accessory(&self, grill_id: &str, sensor_id: &str) -> Option<Accessory> {
        self.grills
            .get(grill_id)
            .and_then(|r| r.accessories.get(sensor_id).cloned())
    }

    fn register_update_callback(&self, grill_id: &str, callback: UpdateCallback) {
        self.callbacks
            .entry(grill_id.to_string())
            .or_default()
            .push(callback);
    }

    async fn set_timer_seconds(&self, grill_id: &str, seconds: i64) -> TraegerResult<()> {
        self.record_timer(grill_id, TimerRequest::Set(seconds))
    }

    async fn reset_timer(&self, grill_id: &str) -> TraegerResult<()> {
        self.record_timer(grill_id, TimerRequest::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use traeger_core::{ProbeReading, SystemStatus, TemperatureUnit};

    fn details() -> GrillDetails {
        GrillDetails {
            thing_name: "abc123".to_string(),
            friendly_name: "Backyard".to_string(),
        }
    }

    #[test]
    fn test_push_fires_callbacks() {
        let client = MemoryGrillClient::new();
        client.add_grill(details(), None, None);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        client.register_update_callback(
            "abc123",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        client
            .push_snapshot(
                "abc123",
                GrillSnapshot::new(SystemStatus::Idle, TemperatureUnit::Fahrenheit),
            )
            .unwrap();
        client
            .push_accessory(
                "abc123",
                Accessory::probe(
                    "p0",
                    ProbeReading {
                        get_temp: 70.0,
                        set_temp: 0.0,
                        alarm_fired: None,
                    },
                ),
            )
            .unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(client.accessory_ids("abc123"), vec!["p0"]);
        assert!(client.grill_state("abc123").is_some());
    }

    #[test]
    fn test_unknown_grill() {
        let client = MemoryGrillClient::new();
        let err = client
            .push_snapshot(
                "nope",
                GrillSnapshot::new(SystemStatus::Idle, TemperatureUnit::Fahrenheit),
            )
            .unwrap_err();
        assert_eq!(err, TraegerError::UnknownGrill("nope".to_string()));
    }

    #[tokio::test]
    async fn test_timer_requests_recorded() {
        let client = MemoryGrillClient::new();
        client.add_grill(details(), None, None);

        client.set_timer_seconds("abc123", 600).await.unwrap();
        client.reset_timer("abc123").await.unwrap();
        assert!(client.reset_timer("nope").await.is_err());

        assert_eq!(
            client.timer_requests(),
            vec![
                ("abc123".to_string(), TimerRequest::Set(600)),
                ("abc123".to_string(), TimerRequest::Reset),
            ]
        );
    }
}
