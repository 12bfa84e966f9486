//! Patch-based land development simulation.
//!
//! A run converts undeveloped cells of a raster landscape to developed ones,
//! step by step, until each subregion's demand schedule is met. Seeds are
//! drawn from a logistic development probability; every accepted seed grows
//! a compact patch, and each conversion raises the development pressure of
//! its surroundings for later steps.
//!
//! The engine runs as a Bevy plugin: `GrowthRun::install` puts a loaded run
//! into the world and each `App::update()` then simulates one step.

use bevy::prelude::*;

pub mod config;
pub mod devpressure;
pub mod driver;
pub mod error;
pub mod growth_params;
pub mod landscape;
pub mod patch_growth;
pub mod predictors;
pub mod probability;
pub mod regions;
pub mod scenario;
pub mod seed_search;
pub mod sim_rng;
pub mod simulation_sets;
pub mod stats;
pub mod step_scheduler;
pub mod storage;
pub mod synthetic;
pub mod undeveloped_index;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use driver::{GrowthRun, RunFinished, RunStatus, StepClock, StepCompleted};
pub use error::GrowthError;
pub use simulation_sets::GrowthSet;

/// Registers run-state resources, events and the per-step system chain.
pub struct GrowthPlugin;

impl Plugin for GrowthPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RunStatus>()
            .init_resource::<StepClock>()
            .init_resource::<stats::RunStats>()
            .init_resource::<undeveloped_index::UndevelopedIndex>()
            .init_resource::<sim_rng::SimRng>()
            .add_event::<StepCompleted>()
            .add_event::<RunFinished>();

        app.configure_sets(
            Update,
            (
                GrowthSet::Prepare,
                GrowthSet::Grow,
                GrowthSet::Report,
                GrowthSet::Export,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                (driver::begin_step, driver::recompute_probabilities)
                    .chain()
                    .in_set(GrowthSet::Prepare),
                driver::grow_regions.in_set(GrowthSet::Grow),
                driver::finish_step.in_set(GrowthSet::Report),
            )
                .distributive_run_if(driver::run_is_active),
        );
    }
}
