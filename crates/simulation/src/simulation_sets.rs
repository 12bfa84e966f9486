//! Step ordering via `SystemSet` phases.
//!
//! One `App::update()` advances the run by exactly one step. All growth
//! systems live in the `Update` schedule and are placed in one of these sets:
//!
//! ```text
//! Prepare  →  Grow  →  Report  →  Export
//! ```
//!
//! * **Prepare** – Advance the step clock and recompute development
//!   probabilities for every undeveloped cell.
//! * **Grow** – Run the per-region demand loop on the landscape.
//! * **Report** – Flush layers, log the step summary and emit
//!   `StepCompleted` / `RunFinished`.
//! * **Export** – Output collaborators (snapshot writers) reading the events
//!   sent in `Report`. Systems here must not mutate growth state.

use bevy::prelude::*;

/// Ordered phases of one simulation step, configured as a chain.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrowthSet {
    Prepare,
    Grow,
    Report,
    Export,
}
