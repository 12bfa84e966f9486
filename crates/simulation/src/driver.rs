//! Step driver: resources describing run progress and the systems that
//! advance a loaded run by one step per `App::update()`.

use bevy::prelude::*;

use crate::devpressure::PressureKernel;
use crate::growth_params::GrowthParams;
use crate::landscape::Landscape;
use crate::probability::ProbabilityModel;
use crate::regions::Regions;
use crate::sim_rng::SimRng;
use crate::stats::RunStats;
use crate::step_scheduler::{StepContext, StepReport};
use crate::storage::GridStorage;
use crate::undeveloped_index::UndevelopedIndex;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Which step is running and how many the run has.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct StepClock {
    /// Step being simulated this frame (1-based); 0 before the first step.
    pub current: u32,
    pub completed: u32,
    pub total: u32,
    /// Calendar year of each step, if the demand table named them.
    pub years: Vec<i32>,
}

impl StepClock {
    pub fn new(total: u32, years: Vec<i32>) -> Self {
        Self {
            current: 0,
            completed: 0,
            total,
            years,
        }
    }

    pub fn is_last(&self, step: u32) -> bool {
        step >= self.total
    }

    pub fn year_of(&self, step: u32) -> Option<i32> {
        step.checked_sub(1)
            .and_then(|i| self.years.get(i as usize))
            .copied()
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub enum RunStatus {
    /// No run installed.
    #[default]
    Idle,
    Running,
    Finished,
    /// A fatal error stopped the run; the message is the error's display.
    Failed(String),
}

impl RunStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::Failed(_))
    }
}

/// Sent once per step after all regions have grown.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCompleted {
    pub step: u32,
    pub year: Option<i32>,
    pub is_last: bool,
}

/// Sent after the last step.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFinished {
    pub steps: u32,
}

// ---------------------------------------------------------------------------
// Installing a run
// ---------------------------------------------------------------------------

/// A fully loaded, validated run ready to be placed into a world.
#[derive(Debug)]
pub struct GrowthRun {
    pub landscape: Landscape,
    pub regions: Regions,
    pub model: ProbabilityModel,
    pub params: GrowthParams,
    pub years: Vec<i32>,
}

impl GrowthRun {
    /// Insert every resource the growth systems read and mark the run as
    /// running. Replaces any previously installed run.
    pub fn install(self, world: &mut World) {
        let params = self.params;
        info!(
            "Installing growth run: {}x{} grid, {} regions, {} steps, seed {}",
            self.landscape.dims().rows,
            self.landscape.dims().cols,
            self.regions.len(),
            params.num_steps,
            params.random_seed
        );
        world.insert_resource(PressureKernel::new(&params.pressure));
        world.insert_resource(SimRng::from_seed_u64(params.random_seed));
        world.insert_resource(StepClock::new(params.num_steps, self.years));
        world.insert_resource(RunStats::default());
        world.insert_resource(UndevelopedIndex::default());
        world.insert_resource(self.landscape);
        world.insert_resource(self.regions);
        world.insert_resource(self.model);
        world.insert_resource(params);
        world.insert_resource(RunStatus::Running);
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn run_is_active(status: Res<RunStatus>) -> bool {
    *status == RunStatus::Running
}

pub fn begin_step(mut clock: ResMut<StepClock>) {
    clock.current = clock.completed + 1;
}

pub fn recompute_probabilities(
    mut land: ResMut<Landscape>,
    regions: Res<Regions>,
    model: Res<ProbabilityModel>,
    mut index: ResMut<UndevelopedIndex>,
    mut status: ResMut<RunStatus>,
) {
    if let Err(e) = index.recompute(&mut land, &regions, &model) {
        error!("Probability recompute failed: {e}");
        *status = RunStatus::Failed(e.to_string());
    }
}

#[allow(clippy::too_many_arguments)]
pub fn grow_regions(
    mut land: ResMut<Landscape>,
    mut regions: ResMut<Regions>,
    mut index: ResMut<UndevelopedIndex>,
    kernel: Res<PressureKernel>,
    params: Res<GrowthParams>,
    mut rng: ResMut<SimRng>,
    clock: Res<StepClock>,
    mut stats: ResMut<RunStats>,
) {
    let step = clock.current;
    let mut ctx = StepContext {
        land: &mut land,
        regions: &mut regions,
        index: &mut index,
        kernel: &kernel,
        params: &params,
        rng: &mut rng.0,
    };
    let reports = ctx.run_step(step, clock.is_last(step));
    stats.record(StepReport {
        step,
        year: clock.year_of(step),
        regions: reports,
    });
}

pub fn finish_step(
    mut clock: ResMut<StepClock>,
    mut land: ResMut<Landscape>,
    stats: Res<RunStats>,
    mut status: ResMut<RunStatus>,
    mut completed: EventWriter<StepCompleted>,
    mut finished: EventWriter<RunFinished>,
) {
    let step = clock.current;
    land.developed.flush();
    land.pressure.flush();

    if let Some(report) = stats.last() {
        for r in &report.regions {
            info!(
                "Step {step}, region {}: demand {}, target {}, converted {}, spilled {}, overflow {}",
                r.region, r.demand, r.target, r.converted, r.spilled, r.overflow_after
            );
        }
    }

    clock.completed = step;
    let is_last = clock.is_last(step);
    completed.send(StepCompleted {
        step,
        year: clock.year_of(step),
        is_last,
    });
    if is_last {
        info!(
            "Growth run finished after {step} steps, {} cells converted",
            stats.total_converted()
        );
        *status = RunStatus::Finished;
        finished.send(RunFinished { steps: step });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_years_and_last_step() {
        let clock = StepClock::new(3, vec![2020, 2021]);
        assert_eq!(clock.year_of(1), Some(2020));
        assert_eq!(clock.year_of(3), None);
        assert_eq!(clock.year_of(0), None);
        assert!(!clock.is_last(2));
        assert!(clock.is_last(3));
    }

    #[test]
    fn test_status_done() {
        assert!(!RunStatus::Idle.is_done());
        assert!(!RunStatus::Running.is_done());
        assert!(RunStatus::Finished.is_done());
        assert!(RunStatus::Failed("x".into()).is_done());
    }
}
