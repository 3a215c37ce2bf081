//! Traeger telemetry replay
//!
//! Drives the sensor and number platforms from a recorded telemetry file,
//! with commands going to logging stand-ins for the host's climate and
//! switch services.
//!
//! Usage: `traeger-replay <recording> [config-dir]`

mod telemetry;

use anyhow::{bail, Context as _, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use traeger_config::{IntegrationConfig, CONFIG_FILE};
use traeger_core::{Context, EntityId, ServiceCall};
use traeger_platform::{MemoryGrillClient, TraegerPlatform};
use traeger_services::{command_channel, ServiceRegistry, StateStore};

use crate::telemetry::Recording;

/// Services the platforms call on the host
const HOST_SERVICES: [(&str, &str); 4] = [
    ("climate", "set_temperature"),
    ("climate", "set_hvac_mode"),
    ("switch", "turn_on"),
    ("switch", "turn_off"),
];

fn load_config(config_dir: &Path) -> Result<IntegrationConfig> {
    if !config_dir.join(CONFIG_FILE).exists() {
        return Ok(IntegrationConfig::default());
    }
    IntegrationConfig::load(config_dir)
        .with_context(|| format!("failed to load {}", config_dir.join(CONFIG_FILE).display()))
}

fn init_tracing(config: &IntegrationConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_ascii_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn register_host_services(registry: &ServiceRegistry) {
    for (domain, service) in HOST_SERVICES {
        registry.register(domain, service, |call: ServiceCall| async move {
            info!(service = %call.service_id(), data = %call.service_data, "Grill command");
            Ok(None)
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(recording_path) = args.next().map(PathBuf::from) else {
        bail!("usage: traeger-replay <recording> [config-dir]");
    };
    let config_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let config = load_config(&config_dir)?;
    init_tracing(&config)?;

    info!(recording = %recording_path.display(), "Starting Traeger replay");
    let recording = Recording::load(&recording_path)?;
    let grill_id = recording.grill.thing_name.clone();

    let client = Arc::new(MemoryGrillClient::new());
    client.add_grill(recording.grill, recording.limits, recording.features);

    let states = Arc::new(StateStore::new());
    let registry = Arc::new(ServiceRegistry::new());
    register_host_services(&registry);

    let (commands, dispatcher) = command_channel(registry.clone(), config.dispatch.enabled);
    let dispatcher = dispatcher.spawn();

    let mut changes = states.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            let changed = change
                .old_state
                .as_ref()
                .map_or(true, |old| old.state != change.new_state.state);
            if changed {
                debug!(entity_id = %change.entity_id, state = %change.new_state.state, "State changed");
            }
        }
    });

    let platform = TraegerPlatform::new(client.clone(), states.clone(), commands);
    let entities = platform.setup()?;
    platform.register_services(&registry);
    info!(entities, "Platform ready");

    let cycle = EntityId::for_grill("number", &grill_id, "cook_cycle")?.to_string();
    if let Some(name) = &config.replay.program {
        let Some(steps) = config.program(name) else {
            bail!("unknown cook program: {}", name);
        };
        registry
            .call(
                "traeger",
                "set_custom_cook",
                json!({"entity_id": cycle, "steps": steps}),
                Context::new(),
            )
            .await?;
        info!(program = %name, steps = steps.len(), "Loaded cook program");
    }
    if let Some(step) = config.replay.start_step {
        registry
            .call(
                "number",
                "set_value",
                json!({"entity_id": cycle, "value": step}),
                Context::new(),
            )
            .await?;
    }

    let interval = Duration::from_millis(config.replay.interval_ms);
    for (n, frame) in recording.frames.into_iter().enumerate() {
        debug!(frame = n, "Replaying frame");
        for accessory in frame.accessories {
            client.push_accessory(&grill_id, accessory)?;
        }
        for uuid in &frame.removed {
            if let Err(err) = client.remove_accessory(&grill_id, uuid) {
                warn!(%uuid, error = %err, "Could not remove accessory");
            }
        }
        if let Some(status) = frame.status {
            client.push_snapshot(&grill_id, status)?;
        }
        tokio::time::sleep(interval).await;
    }

    // let in-flight commands reach the host services
    tokio::time::sleep(Duration::from_millis(50)).await;

    for state in states.all() {
        println!("{} = {}", state.entity_id, state.state);
    }
    let timers = client.timer_requests();
    if !timers.is_empty() {
        info!(count = timers.len(), "Timer requests sent to grill");
    }

    dispatcher.abort();
    watcher.abort();
    Ok(())
}
