//! Per-grill entity setup and update wiring
//!
//! Each grill owns its sensors and numbers behind one lock. A telemetry push
//! re-evaluates all of them, publishes the results to the state store and
//! queues whatever commands the cook cycle produced. Service calls mutate
//! entities under the same lock.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};
use traeger_core::{
    Context, CookStep, GrillCommand, GrillData, GrillTargets, ServiceCall, TraegerError,
    TraegerResult, DOMAIN,
};
use traeger_number::{NumberAction, NumberEntity};
use traeger_sensor::{SensorEntity, SensorKind};
use traeger_services::{
    CommandSender, ServiceDescription, ServiceError, ServiceRegistry, SharedStateStore,
};

use crate::client::{grill_data, GrillClient};

/// Entities of one grill
struct GrillEntities {
    grill_id: String,
    targets: GrillTargets,
    sensors: Vec<SensorEntity>,
    numbers: Vec<NumberEntity>,
}

impl GrillEntities {
    fn new(grill_id: &str, friendly_name: Option<&str>) -> TraegerResult<Self> {
        Ok(Self {
            grill_id: grill_id.to_string(),
            targets: GrillTargets::new(grill_id, friendly_name)?,
            sensors: SensorEntity::standard_set(grill_id)?,
            numbers: NumberEntity::standard_set(grill_id)?,
        })
    }

    /// Add a probe sensor for every accessory not seen before
    fn discover_probes(&mut self, data: &GrillData) -> usize {
        let mut added = 0;
        for sensor_id in data.accessories.keys() {
            let known = self.sensors.iter().any(|s| {
                matches!(s.kind(), SensorKind::ProbeState { sensor_id: known, .. } if known == sensor_id)
            });
            if known {
                continue;
            }
            match SensorEntity::probe(&self.grill_id, sensor_id.as_str()) {
                Ok(sensor) => {
                    info!(grill_id = %self.grill_id, %sensor_id, "Adding probe sensor");
                    self.sensors.push(sensor);
                    added += 1;
                }
                Err(err) => warn!(%sensor_id, error = %err, "Skipping probe with unusable id"),
            }
        }
        added
    }

    fn number_mut(&mut self, entity_id: &str) -> TraegerResult<&mut NumberEntity> {
        self.numbers
            .iter_mut()
            .find(|n| n.entity_id().matches(entity_id))
            .ok_or_else(|| TraegerError::UnknownEntity(entity_id.to_string()))
    }
}

fn lock(entities: &Mutex<GrillEntities>) -> MutexGuard<'_, GrillEntities> {
    entities.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sensor and number platforms for every grill of one client
pub struct TraegerPlatform {
    client: Arc<dyn GrillClient>,
    states: SharedStateStore,
    commands: CommandSender,
    grills: DashMap<String, Arc<Mutex<GrillEntities>>>,
    /// Number entity id to owning grill id
    numbers: DashMap<String, String>,
}

impl TraegerPlatform {
    pub fn new(
        client: Arc<dyn GrillClient>,
        states: SharedStateStore,
        commands: CommandSender,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            states,
            commands,
            grills: DashMap::new(),
            numbers: DashMap::new(),
        })
    }

    /// Create entities for every grill, hook up update callbacks and publish
    /// the initial states. Returns the number of entities created.
    #[instrument(skip(self))]
    pub fn setup(self: &Arc<Self>) -> TraegerResult<usize> {
        let mut count = 0;
        let grills = self.client.grills();

        for details in &grills {
            let grill_id = details.thing_name.clone();
            if self.grills.contains_key(&grill_id) {
                debug!(%grill_id, "Grill already set up");
                continue;
            }

            let entities = GrillEntities::new(&grill_id, Some(&details.friendly_name))?;
            for number in &entities.numbers {
                self.numbers
                    .insert(number.entity_id().to_string(), grill_id.clone());
            }
            count += entities.sensors.len() + entities.numbers.len();
            self.grills
                .insert(grill_id.clone(), Arc::new(Mutex::new(entities)));

            let platform = Arc::downgrade(self);
            let id = grill_id.clone();
            self.client.register_update_callback(
                &grill_id,
                Arc::new(move || {
                    if let Some(platform) = platform.upgrade() {
                        platform.update(&id);
                    }
                }),
            );

            self.update(&grill_id);
        }

        info!(grills = grills.len(), entities = count, "Traeger platform set up");
        Ok(count)
    }

    /// Register `traeger.set_custom_cook`, `traeger.set_timer` and
    /// `number.set_value`
    pub fn register_services(self: &Arc<Self>, registry: &ServiceRegistry) {
        let platform = Arc::clone(self);
        let mut description = ServiceDescription::new(DOMAIN, "set_custom_cook");
        description.name = Some("Set custom cook".to_string());
        description.description = Some("Load a cook cycle into a cook cycle number".to_string());
        description.schema = Some(serde_json::json!({
            "entity_id": {"required": true},
            "steps": {"required": true, "selector": {"object": {}}}
        }));
        registry.register_with_description(description, move |call: ServiceCall| {
            let platform = platform.clone();
            async move {
                let steps: Vec<CookStep> = call.get("steps").ok_or_else(|| {
                    ServiceError::InvalidData("steps must be a list of cook steps".to_string())
                })?;
                for entity_id in target_entities(&call)? {
                    platform.set_custom_cook(&entity_id, steps.clone())?;
                }
                Ok(None)
            }
        });

        let platform = Arc::clone(self);
        let mut description = ServiceDescription::new(DOMAIN, "set_timer");
        description.name = Some("Set timer".to_string());
        description.description = Some("Start the grill's cook timer, in seconds".to_string());
        description.schema = Some(serde_json::json!({
            "entity_id": {"required": true},
            "seconds": {"required": true, "selector": {"number": {}}}
        }));
        registry.register_with_description(description, move |call: ServiceCall| {
            let platform = platform.clone();
            async move {
                let seconds: i64 = call.get("seconds").ok_or_else(|| {
                    ServiceError::InvalidData("seconds must be a whole number".to_string())
                })?;
                for entity_id in target_entities(&call)? {
                    platform.set_timer_seconds(&entity_id, seconds).await?;
                }
                Ok(None)
            }
        });

        let platform = Arc::clone(self);
        let mut description = ServiceDescription::new("number", "set_value");
        description.name = Some("Set value".to_string());
        description.schema = Some(serde_json::json!({
            "entity_id": {"required": true},
            "value": {"required": true, "selector": {"number": {}}}
        }));
        registry.register_with_description(description, move |call: ServiceCall| {
            let platform = platform.clone();
            async move {
                let value: f64 = call
                    .get("value")
                    .ok_or_else(|| ServiceError::InvalidData("value must be a number".to_string()))?;
                for entity_id in target_entities(&call)? {
                    platform.set_number_value(&entity_id, value).await?;
                }
                Ok(None)
            }
        });

        info!("Traeger services registered");
    }

    /// Re-evaluate every entity of a grill; returns the number of queued commands
    #[instrument(level = "debug", skip(self))]
    pub fn update(&self, grill_id: &str) -> usize {
        let Some(entities) = self.grills.get(grill_id).map(|e| e.clone()) else {
            warn!(grill_id, "Update for unknown grill");
            return 0;
        };
        let data = grill_data(self.client.as_ref(), grill_id);
        let context = Context::new();

        let commands = {
            let mut guard = lock(&entities);
            guard.discover_probes(&data);

            for sensor in guard.sensors.iter_mut() {
                let report = sensor.evaluate(&data);
                self.states.publish(&report, context.clone());
            }

            let GrillEntities {
                targets, numbers, ..
            } = &mut *guard;
            let mut commands = Vec::new();
            for number in numbers.iter_mut() {
                commands.extend(self.evaluate_number(number, &data, targets, &context));
            }
            commands
        };

        self.commands.send_all(commands, &context)
    }

    /// Re-evaluate one number only
    fn update_number(&self, grill_id: &str, entity_id: &str) -> TraegerResult<usize> {
        let entities = self.entities(grill_id)?;
        let data = grill_data(self.client.as_ref(), grill_id);
        let context = Context::new();

        let commands = {
            let mut guard = lock(&entities);
            let GrillEntities {
                targets, numbers, ..
            } = &mut *guard;
            let number = numbers
                .iter_mut()
                .find(|n| n.entity_id().matches(entity_id))
                .ok_or_else(|| TraegerError::UnknownEntity(entity_id.to_string()))?;
            self.evaluate_number(number, &data, targets, &context)
        };

        Ok(self.commands.send_all(commands, &context))
    }

    fn evaluate_number(
        &self,
        number: &mut NumberEntity,
        data: &GrillData,
        targets: &GrillTargets,
        context: &Context,
    ) -> Vec<GrillCommand> {
        let (report, commands) = number.evaluate(data, targets);
        self.states.publish(&report, context.clone());
        commands
    }

    /// Replace the steps of a cook cycle number
    #[instrument(skip(self, steps), fields(steps = steps.len()))]
    pub fn set_custom_cook(&self, entity_id: &str, steps: Vec<CookStep>) -> TraegerResult<()> {
        let grill_id = self.number_owner(entity_id)?;
        {
            let entities = self.entities(&grill_id)?;
            let mut guard = lock(&entities);
            guard.number_mut(entity_id)?.set_custom_cook(steps)?;
        }
        self.update_number(&grill_id, entity_id)?;
        Ok(())
    }

    /// Apply `number.set_value` to one of our numbers
    #[instrument(skip(self))]
    pub async fn set_number_value(&self, entity_id: &str, value: f64) -> TraegerResult<()> {
        let grill_id = self.number_owner(entity_id)?;
        let entities = self.entities(&grill_id)?;
        let data = grill_data(self.client.as_ref(), &grill_id);

        let action = {
            let mut guard = lock(&entities);
            guard.number_mut(entity_id)?.set_value(value, &data)?
        };
        self.apply(&grill_id, entity_id, action).await
    }

    /// Start the cook timer with an exact number of seconds
    #[instrument(skip(self))]
    pub async fn set_timer_seconds(&self, entity_id: &str, seconds: i64) -> TraegerResult<()> {
        let grill_id = self.number_owner(entity_id)?;
        let entities = self.entities(&grill_id)?;
        let data = grill_data(self.client.as_ref(), &grill_id);

        let action = {
            let mut guard = lock(&entities);
            guard.number_mut(entity_id)?.set_timer_seconds(seconds, &data)?
        };
        self.apply(&grill_id, entity_id, action).await
    }

    /// Carry out what a number asked for after accepting a value
    async fn apply(
        &self,
        grill_id: &str,
        entity_id: &str,
        action: NumberAction,
    ) -> TraegerResult<()> {
        match action {
            NumberAction::Evaluate => {
                self.update_number(grill_id, entity_id)?;
            }
            NumberAction::SetTimer(seconds) => {
                self.client.set_timer_seconds(grill_id, seconds).await?;
            }
            NumberAction::ResetTimer => {
                self.client.reset_timer(grill_id).await?;
            }
            NumberAction::Nothing => {}
        }
        Ok(())
    }

    /// Ids of every entity created so far, sorted
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .grills
            .iter()
            .flat_map(|entry| {
                let guard = lock(entry.value());
                guard
                    .sensors
                    .iter()
                    .map(|s| s.entity_id().to_string())
                    .chain(guard.numbers.iter().map(|n| n.entity_id().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        ids.sort();
        ids
    }

    fn number_owner(&self, entity_id: &str) -> TraegerResult<String> {
        self.numbers
            .get(entity_id)
            .map(|g| g.clone())
            .ok_or_else(|| TraegerError::UnknownEntity(entity_id.to_string()))
    }

    fn entities(&self, grill_id: &str) -> TraegerResult<Arc<Mutex<GrillEntities>>> {
        self.grills
            .get(grill_id)
            .map(|e| e.clone())
            .ok_or_else(|| TraegerError::UnknownGrill(grill_id.to_string()))
    }
}

fn target_entities(call: &ServiceCall) -> Result<Vec<String>, ServiceError> {
    let ids = call.entity_ids();
    if ids.is_empty() {
        return Err(ServiceError::InvalidData("entity_id is required".to_string()));
    }
    Ok(ids)
}
