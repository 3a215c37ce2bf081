//! Number platform for Traeger grills
//!
//! Provides the cook cycle step number, which drives a multi-step cook, and
//! the cook timer number.

mod cook_cycle;
mod number;

pub use cook_cycle::{CookCycleSequencer, Evaluation, PROBE_FOLLOW_STEP};
pub use number::{NumberAction, NumberEntity, NumberKind, COOK_CYCLE_MAX, COOK_TIMER_MAX};
