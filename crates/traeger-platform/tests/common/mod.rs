//! Shared harness for platform integration tests
//!
//! Wires an in-memory grill client, a state store, a service registry with
//! recording stand-ins for the host's climate and switch services, and a
//! running command dispatcher.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use traeger_core::{
    Accessory, GrillDetails, GrillFeatures, GrillLimits, GrillSnapshot, ProbeReading,
    ServiceCall, SystemStatus, TemperatureUnit,
};
use traeger_platform::{MemoryGrillClient, TraegerPlatform};
use traeger_services::{command_channel, ServiceRegistry, StateStore};

pub const GRILL: &str = "0123456789ab";

pub struct Harness {
    pub client: Arc<MemoryGrillClient>,
    pub states: Arc<StateStore>,
    pub registry: Arc<ServiceRegistry>,
    pub platform: Arc<TraegerPlatform>,
    host_calls: mpsc::UnboundedReceiver<ServiceCall>,
}

impl Harness {
    /// Set up with one grill; `initial` is pushed before the platform starts
    pub fn new(initial: Option<GrillSnapshot>) -> Self {
        let client = Arc::new(MemoryGrillClient::new());
        client.add_grill(
            GrillDetails {
                thing_name: GRILL.to_string(),
                friendly_name: "Backyard Grill".to_string(),
            },
            Some(GrillLimits {
                max_grill_temp: 500.0,
            }),
            Some(GrillFeatures {
                super_smoke_enabled: true,
                pellet_sensor_connected: true,
            }),
        );
        if let Some(snapshot) = initial {
            client.push_snapshot(GRILL, snapshot).unwrap();
        }

        let registry = Arc::new(ServiceRegistry::new());
        let (tx, host_calls) = mpsc::unbounded_channel();
        for (domain, service) in [
            ("climate", "set_temperature"),
            ("climate", "set_hvac_mode"),
            ("switch", "turn_on"),
            ("switch", "turn_off"),
        ] {
            let tx = tx.clone();
            registry.register(domain, service, move |call: ServiceCall| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(call);
                    Ok(None)
                }
            });
        }

        let states = Arc::new(StateStore::new());
        let (sender, dispatcher) = command_channel(registry.clone(), true);
        dispatcher.spawn();

        let platform = TraegerPlatform::new(client.clone(), states.clone(), sender);
        platform.setup().unwrap();
        platform.register_services(&registry);

        Self {
            client,
            states,
            registry,
            platform,
            host_calls,
        }
    }

    pub fn push(&self, snapshot: GrillSnapshot) {
        self.client.push_snapshot(GRILL, snapshot).unwrap();
    }

    pub fn push_probe(&self, reading: ProbeReading, connected: bool) {
        let mut accessory = Accessory::probe("p0", reading);
        accessory.con = connected;
        self.client.push_accessory(GRILL, accessory).unwrap();
    }

    /// Published state value of an entity
    pub fn state(&self, entity_id: &str) -> String {
        self.states
            .get_state(entity_id)
            .unwrap_or_else(|| panic!("no state for {}", entity_id))
    }

    /// Next call that reached a host service
    pub async fn next_host_call(&mut self) -> ServiceCall {
        tokio::time::timeout(Duration::from_secs(1), self.host_calls.recv())
            .await
            .expect("timed out waiting for a host service call")
            .expect("host call channel closed")
    }

    /// `count` host calls, sorted by service id
    pub async fn host_calls(&mut self, count: usize) -> Vec<ServiceCall> {
        let mut calls = Vec::with_capacity(count);
        for _ in 0..count {
            calls.push(self.next_host_call().await);
        }
        calls.sort_by_key(|c| c.service_id());
        calls
    }

    pub fn no_pending_host_calls(&mut self) -> bool {
        self.host_calls.try_recv().is_err()
    }
}

pub fn snapshot(status: SystemStatus, grill: f64, set: f64) -> GrillSnapshot {
    GrillSnapshot::new(status, TemperatureUnit::Fahrenheit).with_temps(grill, set)
}

/// Poll until `check` passes or a second has gone by
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
