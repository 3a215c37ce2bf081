//! Number entities exposed per grill

use serde_json::{json, Map};
use tracing::{debug, info};
use traeger_core::{
    format_number, CookStep, EntityId, EntityIdError, EntityReport, GrillCommand, GrillData,
    GrillTargets, TraegerError, TraegerResult,
};

use crate::cook_cycle::CookCycleSequencer;

/// Largest selectable cook cycle step
pub const COOK_CYCLE_MAX: f64 = 999.0;

/// Longest cook timer, in minutes
pub const COOK_TIMER_MAX: f64 = 1440.0;

/// The closed set of numbers this platform provides
#[derive(Debug, Clone)]
pub enum NumberKind {
    CookCycle(CookCycleSequencer),
    CookTimer,
}

impl NumberKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::CookCycle(_) => "cook_cycle",
            Self::CookTimer => "cook_timer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CookCycle(_) => "Cook Cycle Step",
            Self::CookTimer => "Cook Timer",
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            Self::CookCycle(_) => (0.0, COOK_CYCLE_MAX),
            Self::CookTimer => (0.0, COOK_TIMER_MAX),
        }
    }
}

/// What the caller has to do after a value was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberAction {
    /// Evaluate the entity again right away
    Evaluate,
    /// Ask the grill to start a timer of this many seconds
    SetTimer(i64),
    /// Ask the grill to clear its timer
    ResetTimer,
    Nothing,
}

/// A number bound to one grill
#[derive(Debug, Clone)]
pub struct NumberEntity {
    grill_id: String,
    entity_id: EntityId,
    kind: NumberKind,
}

impl NumberEntity {
    pub fn new(grill_id: impl Into<String>, kind: NumberKind) -> Result<Self, EntityIdError> {
        let grill_id = grill_id.into();
        let entity_id = EntityId::for_grill("number", &grill_id, kind.key())?;
        Ok(Self {
            grill_id,
            entity_id,
            kind,
        })
    }

    /// Cook cycle and cook timer for one grill
    pub fn standard_set(grill_id: &str) -> Result<Vec<Self>, EntityIdError> {
        Ok(vec![
            Self::new(grill_id, NumberKind::CookCycle(CookCycleSequencer::new()))?,
            Self::new(grill_id, NumberKind::CookTimer)?,
        ])
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn kind(&self) -> &NumberKind {
        &self.kind
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.grill_id, self.kind.key())
    }

    /// Whether this is the cook cycle number
    pub fn is_cook_cycle(&self) -> bool {
        matches!(self.kind, NumberKind::CookCycle(_))
    }

    /// Replace the cook cycle steps
    pub fn set_custom_cook(&mut self, steps: Vec<CookStep>) -> TraegerResult<()> {
        match &mut self.kind {
            NumberKind::CookCycle(sequencer) => {
                sequencer.set_steps(steps);
                Ok(())
            }
            NumberKind::CookTimer => Err(TraegerError::UnsupportedInCurrentState(
                "Set Custom Cook".to_string(),
            )),
        }
    }

    /// Accept a value from `number.set_value`
    ///
    /// The value is clamped into the number's range. The returned action says
    /// what the platform has to do next; nothing here talks to the grill.
    pub fn set_value(&mut self, value: f64, data: &GrillData) -> TraegerResult<NumberAction> {
        if !value.is_finite() {
            return Err(TraegerError::InvalidServiceData(format!(
                "value must be a number, got {}",
                value
            )));
        }
        let (min, max) = self.kind.range();
        let value = value.clamp(min, max);

        if let NumberKind::CookCycle(sequencer) = &mut self.kind {
            sequencer.set_index(value);
            return Ok(NumberAction::Evaluate);
        }

        // whole minutes; anything below one minute clears the timer
        let seconds = if value < 1.0 {
            0
        } else {
            value.round() as i64 * 60
        };
        self.timer_action(seconds, data)
    }

    /// Accept an exact timer length in seconds, as issued by a cook step
    pub fn set_timer_seconds(
        &mut self,
        seconds: i64,
        data: &GrillData,
    ) -> TraegerResult<NumberAction> {
        match &self.kind {
            NumberKind::CookTimer => {
                self.timer_action(seconds.clamp(0, COOK_TIMER_MAX as i64 * 60), data)
            }
            NumberKind::CookCycle(_) => Err(TraegerError::InvalidServiceData(format!(
                "{} is not a cook timer",
                self.entity_id
            ))),
        }
    }

    fn timer_action(&self, seconds: i64, data: &GrillData) -> TraegerResult<NumberAction> {
        let Some(snapshot) = data.snapshot.as_ref() else {
            debug!(grill_id = %self.grill_id, "No telemetry yet, ignoring timer value");
            return Ok(NumberAction::Nothing);
        };
        if !snapshot.system_status.is_active_cooking() {
            return Err(TraegerError::UnsupportedInCurrentState(
                "Set Timer".to_string(),
            ));
        }
        if seconds < 1 {
            info!(grill_id = %self.grill_id, "Resetting cook timer");
            Ok(NumberAction::ResetTimer)
        } else {
            info!(grill_id = %self.grill_id, seconds, "Setting cook timer");
            Ok(NumberAction::SetTimer(seconds))
        }
    }

    /// Recompute the number and collect the commands it wants dispatched
    pub fn evaluate(
        &mut self,
        data: &GrillData,
        targets: &GrillTargets,
    ) -> (EntityReport, Vec<GrillCommand>) {
        let (min, max) = self.kind.range();
        let mut extra = Map::new();
        extra.insert("min".to_string(), json!(min));
        extra.insert("max".to_string(), json!(max));
        extra.insert("step".to_string(), json!(1.0));
        extra.insert("mode".to_string(), json!("box"));

        let (value, icon, unit, available, commands) = match &mut self.kind {
            NumberKind::CookCycle(sequencer) => {
                let evaluation = sequencer.evaluate(data, targets);
                extra.extend(sequencer.diagnostics());
                (
                    evaluation.index.to_string(),
                    "mdi:chef-hat",
                    None,
                    true,
                    evaluation.commands,
                )
            }
            NumberKind::CookTimer => (
                data.snapshot
                    .as_ref()
                    .map(|s| format_number(s.cook_timer_minutes()))
                    .unwrap_or_default(),
                "mdi:timer",
                Some("min".to_string()),
                data.available(),
                Vec::new(),
            ),
        };

        let report = EntityReport {
            entity_id: self.entity_id.clone(),
            unique_id: self.unique_id(),
            name: data.display_name(self.kind.label()),
            icon,
            unit,
            available,
            value,
            extra,
        };
        (report, commands)
    }
}
