//! # TestRun — headless harness for growth runs
//!
//! Wraps a `bevy::app::App` with `GrowthPlugin` so tests and benches can
//! describe a small scenario fluently, step it with `App::update()` and
//! assert on the resulting ECS state.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::driver::{GrowthRun, RunStatus, StepCompleted};
use crate::growth_params::GrowthParams;
use crate::landscape::{Landscape, UNDEVELOPED};
use crate::probability::Coefficients;
use crate::regions::Regions;
use crate::scenario::{DemandTable, PatchSizeTable, Scenario};
use crate::simulation_sets::GrowthSet;
use crate::stats::RunStats;
use crate::GrowthPlugin;

/// Every `StepCompleted` seen so far, in order.
#[derive(Resource, Default, Debug)]
pub struct StepLog(pub Vec<StepCompleted>);

fn record_steps(mut events: EventReader<StepCompleted>, mut log: ResMut<StepLog>) {
    log.0.extend(events.read().copied());
}

/// A headless app running one growth run.
pub struct TestRun {
    app: App,
}

impl TestRun {
    /// An app with the plugin but no run installed.
    pub fn idle() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(GrowthPlugin);
        app.init_resource::<StepLog>();
        app.add_systems(Update, record_steps.in_set(GrowthSet::Export));
        Self { app }
    }

    pub fn from_run(run: GrowthRun) -> Self {
        let mut test = Self::idle();
        run.install(test.app.world_mut());
        test
    }

    pub fn from_scenario(scenario: Scenario) -> Self {
        let run = scenario.into_run().expect("test scenario should load");
        Self::from_run(run)
    }

    pub fn builder(rows: usize, cols: usize) -> TestRunBuilder {
        TestRunBuilder::new(rows, cols)
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Simulate one step.
    pub fn step(&mut self) {
        self.app.update();
    }

    pub fn steps(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Step until the run finishes or fails.
    pub fn run_to_end(&mut self) {
        let limit = self.resource::<GrowthParams>().num_steps + 1;
        for _ in 0..limit {
            if self.status().is_done() {
                break;
            }
            self.app.update();
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn status(&self) -> &RunStatus {
        self.resource::<RunStatus>()
    }

    pub fn landscape(&self) -> &Landscape {
        self.resource::<Landscape>()
    }

    pub fn regions(&self) -> &Regions {
        self.resource::<Regions>()
    }

    pub fn stats(&self) -> &RunStats {
        self.resource::<RunStats>()
    }

    pub fn step_log(&self) -> &[StepCompleted] {
        &self.resource::<StepLog>().0
    }

    pub fn developed_at(&self, row: usize, col: usize) -> Option<i32> {
        let land = self.landscape();
        land.dims()
            .cell(row, col)
            .and_then(|cell| land.developed_at(cell))
    }

    /// Cells converted during the run (step 1 or later), per subregion.
    pub fn converted_per_region(&self) -> BTreeMap<i32, u64> {
        let land = self.landscape();
        let mut out = BTreeMap::new();
        for cell in land.dims().cells() {
            let (Some(step), Some(region)) = (land.developed_at(cell), land.region_of(cell)) else {
                continue;
            };
            if step >= 1 {
                *out.entry(region).or_default() += 1;
            }
        }
        out
    }

    /// Snapshot of the developed layer, nulls included.
    pub fn developed_values(&self) -> Vec<i32> {
        self.landscape().developed.values().to_vec()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Per region: own conversions plus cells absorbed from other regions'
    /// patches equal total demand so far plus the current overflow, and match
    /// what the landscape shows.
    pub fn assert_conserved(&self) {
        let steps = self.resource::<crate::driver::StepClock>().completed;
        let regions = self.regions();
        let stats = self.stats();
        let on_grid = self.converted_per_region();
        for (slot, region) in regions.iter().enumerate() {
            let own = stats.converted_by(region.id);
            let absorbed = regions.absorbed[slot];
            let demand = region.total_demand(steps) as i64;
            let overflow = regions.overflow[slot];
            assert_eq!(
                (own + absorbed) as i64,
                demand + overflow,
                "region {}: own {own} + absorbed {absorbed} != demand {demand} + overflow {overflow}",
                region.id
            );
            assert_eq!(
                on_grid.get(&region.id).copied().unwrap_or(0),
                own + absorbed,
                "region {}: landscape disagrees with step reports",
                region.id
            );
        }
    }

    pub fn assert_no_undeveloped_left(&self) {
        let left = self.landscape().developed.count_where(|v| v == UNDEVELOPED);
        assert_eq!(left, 0, "expected every cell developed, {left} left");
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent description of a small scenario. Every cell starts undeveloped in
/// region 1 with zero predictors.
pub struct TestRunBuilder {
    scenario: Scenario,
}

impl TestRunBuilder {
    fn new(rows: usize, cols: usize) -> Self {
        let n = rows * cols;
        Self {
            scenario: Scenario {
                rows,
                cols,
                developed: vec![Some(0); n],
                subregion: vec![Some(1); n],
                potential_subregion: None,
                weight: None,
                pressure: None,
                predictors: BTreeMap::new(),
                demand: DemandTable::default(),
                potential: BTreeMap::new(),
                patch_sizes: PatchSizeTable::default(),
                params: GrowthParams {
                    num_steps: 1,
                    ..Default::default()
                },
            },
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.scenario.cols + col
    }

    /// Add a region with its demand schedule and patch sizes. Its logistic
    /// intercept defaults to 0 (probability 0.5) unless set with `intercept`.
    pub fn region(mut self, id: i32, demand: &[u32], patch_sizes: &[u32]) -> Self {
        self.scenario.demand.regions.insert(id, demand.to_vec());
        self.scenario
            .patch_sizes
            .regions
            .insert(id, patch_sizes.iter().map(|&s| s as f64).collect());
        self.scenario.potential.entry(id).or_insert(Coefficients {
            intercept: 0.0,
            pressure: 0.0,
            predictors: BTreeMap::new(),
        });
        self
    }

    pub fn intercept(mut self, region: i32, intercept: f64) -> Self {
        if let Some(coef) = self.scenario.potential.get_mut(&region) {
            coef.intercept = intercept;
        }
        self
    }

    pub fn pressure_coefficient(mut self, region: i32, pressure: f64) -> Self {
        if let Some(coef) = self.scenario.potential.get_mut(&region) {
            coef.pressure = pressure;
        }
        self
    }

    /// Assign every cell matching `pred(row, col)` to `region`.
    pub fn subregion_where(mut self, region: i32, pred: impl Fn(usize, usize) -> bool) -> Self {
        for row in 0..self.scenario.rows {
            for col in 0..self.scenario.cols {
                if pred(row, col) {
                    let i = self.index(row, col);
                    self.scenario.subregion[i] = Some(region);
                }
            }
        }
        self
    }

    pub fn developed_at_start(mut self, row: usize, col: usize) -> Self {
        let i = self.index(row, col);
        self.scenario.developed[i] = Some(1);
        self
    }

    /// Remove a cell from the study area.
    pub fn excluded(mut self, row: usize, col: usize) -> Self {
        let i = self.index(row, col);
        self.scenario.developed[i] = None;
        self
    }

    pub fn params(mut self, edit: impl FnOnce(&mut GrowthParams)) -> Self {
        edit(&mut self.scenario.params);
        self
    }

    pub fn steps(self, n: u32) -> Self {
        self.params(|p| p.num_steps = n)
    }

    pub fn seed(self, seed: u64) -> Self {
        self.params(|p| p.random_seed = seed)
    }

    pub fn scenario(self) -> Scenario {
        self.scenario
    }

    pub fn build(self) -> TestRun {
        TestRun::from_scenario(self.scenario)
    }
}
