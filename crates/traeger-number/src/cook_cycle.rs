//! Cook cycle sequencer
//!
//! Walks an operator supplied list of [`CookStep`]s. The index is 1-based;
//! 0 means no cycle is running. Every evaluation either checks whether the
//! current step is finished (same index as last time) or runs the entry
//! actions of a step that was just reached:
//!
//! ```text
//! 0 --set_current_step(n)--> n --(entry actions)--> n
//! n --(timer / alarm / temperature condition)--> n+1 --(entry actions)--> ...
//! n --(shutdown step | past last step | grill stopped)--> 0
//! ```
//!
//! Evaluation never performs side effects itself; it returns the commands
//! that should be dispatched.

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use traeger_core::{
    CookStep, GrillCommand, GrillData, GrillSnapshot, GrillTargets, HvacMode, SUPER_SMOKE_MAX_TEMP,
};

/// Degrees added to the grill target each time the probe catches up
pub const PROBE_FOLLOW_STEP: f64 = 5.0;

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub index: usize,
    pub commands: Vec<GrillCommand>,
}

/// Step sequencer state owned by the cook cycle entity
#[derive(Debug, Clone, Default)]
pub struct CookCycleSequencer {
    steps: Vec<CookStep>,
    index: usize,
    previous_index: usize,
}

impl CookCycleSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[CookStep] {
        &self.steps
    }

    /// Current step, 0 when inactive
    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the step sequence; a running cycle is stopped
    pub fn set_steps(&mut self, steps: Vec<CookStep>) {
        info!(steps = steps.len(), "Loaded cook cycle");
        debug!(steps = ?steps, "Cook cycle steps");
        self.steps = steps;
        self.index = 0;
        self.previous_index = 0;
    }

    /// Jump to a step; negative and non-finite values select 0
    ///
    /// The caller is expected to evaluate right away so the entry actions of
    /// the selected step fire without waiting for the next telemetry push.
    pub fn set_index(&mut self, value: f64) {
        self.index = if value.is_finite() && value > 0.0 {
            value.round() as usize
        } else {
            0
        };
        debug!(index = self.index, "Cook cycle step selected");
    }

    /// Run one evaluation against the latest grill data
    pub fn evaluate(&mut self, data: &GrillData, targets: &GrillTargets) -> Evaluation {
        let Some(snapshot) = data.snapshot.as_ref() else {
            return self.stop();
        };

        let len = self.steps.len();
        if self.index > len {
            info!(index = self.index, steps = len, "Cook cycle step out of range");
            return self.stop();
        }
        if self.index > 0 && snapshot.system_status.is_stopped() {
            info!(
                status = snapshot.system_status.label(),
                "Grill is not cooking, cook cycle stopped"
            );
            return self.stop();
        }

        let mut commands = Vec::new();

        if self.index > 0 && self.index == self.previous_index {
            if self.should_advance(snapshot) {
                self.index += 1;
                info!(index = self.index, "Cook cycle advanced");
            } else if let Some(command) = self.probe_follow(data, snapshot, targets) {
                commands.push(command);
            }
        }

        if self.index > 0 && self.index <= len && self.index != self.previous_index {
            commands.extend(self.enter_step(data, snapshot, targets));
        }

        if self.index > len {
            info!("Cook cycle finished");
            self.index = 0;
        }
        self.previous_index = self.index;

        for command in &commands {
            debug!(%command, "Cook cycle command");
        }

        Evaluation {
            index: self.index,
            commands,
        }
    }

    fn stop(&mut self) -> Evaluation {
        self.index = 0;
        self.previous_index = 0;
        Evaluation::default()
    }

    fn current(&self) -> &CookStep {
        &self.steps[self.index - 1]
    }

    /// Advance conditions, first present one wins
    fn should_advance(&self, snapshot: &GrillSnapshot) -> bool {
        let step = self.current();
        match step.use_timer {
            Some(use_timer) => use_timer && snapshot.cook_timer_complete,
            None if snapshot.probe_alarm_fired => true,
            None => match (step.act_temp_adv, step.probe_act_temp_adv) {
                (Some(threshold), _) => snapshot.grill > threshold,
                (None, Some(threshold)) => snapshot.probe > threshold,
                // a bare timer step ends with its timer
                (None, None) => step.time_set.is_some() && snapshot.cook_timer_complete,
            },
        }
    }

    /// Raise the grill target while the probe is within `min_delta` of it
    fn probe_follow(
        &mut self,
        data: &GrillData,
        snapshot: &GrillSnapshot,
        targets: &GrillTargets,
    ) -> Option<GrillCommand> {
        let index = self.index - 1;
        let (min_delta, ceiling) = self.steps[index].probe_follow()?;

        let ceiling = match data.limits {
            Some(limits) if ceiling > limits.max_grill_temp => {
                debug!(
                    ceiling,
                    max = limits.max_grill_temp,
                    "Clamping probe follow ceiling to grill maximum"
                );
                self.steps[index].max_grill_delta_temp = Some(limits.max_grill_temp);
                limits.max_grill_temp
            }
            _ => ceiling,
        };

        if snapshot.set < ceiling && snapshot.probe > snapshot.set - min_delta {
            Some(GrillCommand::SetTemperature {
                entity_id: targets.climate.clone(),
                temperature: (snapshot.set + PROBE_FOLLOW_STEP).round() as i64,
            })
        } else {
            None
        }
    }

    /// Entry actions of the step just reached
    fn enter_step(
        &mut self,
        data: &GrillData,
        snapshot: &GrillSnapshot,
        targets: &GrillTargets,
    ) -> Vec<GrillCommand> {
        let step = self.current().clone();
        let mut commands = Vec::new();
        info!(index = self.index, step = %step, "Entering cook cycle step");

        if let Some(seconds) = step.time_set {
            commands.push(GrillCommand::SetTimer {
                entity_id: targets.cook_timer.clone(),
                seconds: seconds.round() as i64,
            });
        }

        if let Some(temperature) = step.probe_set_temp {
            match &targets.probe_climate {
                Some(entity_id) => commands.push(GrillCommand::SetTemperature {
                    entity_id: entity_id.clone(),
                    temperature: temperature.round() as i64,
                }),
                None => warn!("No probe climate entity known, skipping probe_set_temp"),
            }
        }

        if let Some(temperature) = step.set_temp {
            commands.push(GrillCommand::SetTemperature {
                entity_id: targets.climate.clone(),
                temperature: temperature.round() as i64,
            });
        }

        if let Some(smoke) = step.smoke {
            let super_smoke = data.features.is_some_and(|f| f.super_smoke_enabled);
            if super_smoke && snapshot.smoke != smoke && snapshot.set <= SUPER_SMOKE_MAX_TEMP {
                commands.push(GrillCommand::Switch {
                    entity_id: targets.smoke.clone(),
                    on: smoke,
                });
            }
        }

        if let Some(keepwarm) = step.keepwarm {
            if snapshot.keepwarm != keepwarm {
                commands.push(GrillCommand::Switch {
                    entity_id: targets.keepwarm.clone(),
                    on: keepwarm,
                });
            }
        }

        if step.is_shutdown() {
            commands.push(GrillCommand::SetHvacMode {
                entity_id: targets.climate.clone(),
                hvac_mode: HvacMode::Cool,
            });
            info!("Cook cycle shutdown step reached");
            self.index = 0;
        }

        commands
    }

    /// Previous/current/next step summaries plus every step, 1-based
    pub fn diagnostics(&self) -> Map<String, Value> {
        let summary = |n: usize| match n.checked_sub(1).and_then(|i| self.steps.get(i)) {
            Some(step) => format!("{}: {}", n, step),
            None => "{}".to_string(),
        };

        let mut attributes = Map::new();
        attributes.insert(
            "prev_step".to_string(),
            json!(if self.index > 1 {
                summary(self.index - 1)
            } else {
                "{}".to_string()
            }),
        );
        attributes.insert("curr_step".to_string(), json!(summary(self.index)));
        attributes.insert(
            "next_step".to_string(),
            json!(summary(self.index.saturating_add(1))),
        );
        for (i, step) in self.steps.iter().enumerate() {
            attributes.insert(format!("_step{:02}", i + 1), json!(step.to_string()));
        }
        attributes
    }
}
