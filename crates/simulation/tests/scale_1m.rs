//! Scale tests proving the growth engine handles a 1M-cell landscape.
//!
//! These tests exercise the core pipeline at 1000x1000:
//! - Probability recompute scores every undeveloped cell in one pass
//! - Per-region buckets stay normalized at full size
//! - A step converting thousands of cells across four regions conserves demand
//! - Pressure kernel updates stay local to the converted cells
//!
//! Run: cargo test -p simulation --test scale_1m

use std::collections::BTreeMap;
use std::time::Instant;

use simulation::devpressure::PressureKernel;
use simulation::growth_params::{GrowthParams, PressureDecay, PressureParams};
use simulation::landscape::Landscape;
use simulation::probability::{Coefficients, ProbabilityModel};
use simulation::regions::{Region, Regions};
use simulation::sim_rng::SimRng;
use simulation::step_scheduler::StepContext;
use simulation::storage::{GridDims, GridStorage};
use simulation::undeveloped_index::UndevelopedIndex;

const SIDE: usize = 1000;

/// Four quadrant regions with a predictor gradient running west to east.
fn quadrant_landscape() -> Landscape {
    let dims = GridDims::new(SIDE, SIDE);
    let mut land = Landscape::open(dims);
    for cell in dims.cells() {
        let (row, col) = dims.row_col(cell);
        let region = 1 + (row >= SIDE / 2) as i32 * 2 + (col >= SIDE / 2) as i32;
        land.subregion.put(cell, Some(region));
        land.predictor.put(cell, Some(col as f32 / SIDE as f32 * 2.0 - 1.0));
    }
    land.subregion.flush();
    land.predictor.flush();
    land
}

fn quadrant_regions(per_step: u32) -> Regions {
    Regions::new(
        (1..=4)
            .map(|id| Region {
                id,
                demand: vec![per_step; 3],
                patch_sizes: vec![1, 5, 10, 25, 50],
            })
            .collect(),
    )
    .expect("quadrant regions")
}

fn quadrant_model() -> ProbabilityModel {
    let coefficients = (1..=4)
        .map(|id| {
            (
                id,
                Coefficients {
                    intercept: -1.0 + 0.25 * id as f64,
                    pressure: 0.05,
                    predictors: BTreeMap::new(),
                },
            )
        })
        .collect();
    ProbabilityModel::new(coefficients, None)
}

// ---------------------------------------------------------------------------
// 1. Recompute covers every cell of a 1M-cell grid
// ---------------------------------------------------------------------------

#[test]
fn test_recompute_scores_1m_cells() {
    let mut land = quadrant_landscape();
    let regions = quadrant_regions(0);
    let model = quadrant_model();
    let mut index = UndevelopedIndex::default();

    let start = Instant::now();
    index
        .recompute(&mut land, &regions, &model)
        .expect("recompute");
    let elapsed = start.elapsed();

    let total: usize = (0..regions.len()).map(|slot| index.bucket(slot).len()).sum();
    assert_eq!(total, SIDE * SIDE);
    for slot in 0..regions.len() {
        let entries = index.bucket(slot).entries();
        assert_eq!(entries.len(), SIDE * SIDE / 4);
        assert_eq!(entries.last().map(|e| e.cumulative), Some(1.0));
        assert!(entries.windows(2).all(|w| w[0].cumulative <= w[1].cumulative));
    }
    assert!(!land.probability.is_dirty());

    println!(
        "Recompute over {} cells: {}ms",
        SIDE * SIDE,
        elapsed.as_millis()
    );
    assert!(
        elapsed.as_secs() < 10,
        "Recompute of 1M cells took {}ms, expected well under 10s",
        elapsed.as_millis()
    );
}

// ---------------------------------------------------------------------------
// 2. Full steps at scale conserve demand
// ---------------------------------------------------------------------------

#[test]
fn test_three_steps_convert_30k_cells() {
    let per_step = 2_500;
    let mut land = quadrant_landscape();
    let mut regions = quadrant_regions(per_step);
    let model = quadrant_model();
    let params = GrowthParams {
        num_steps: 3,
        pressure: PressureParams {
            decay: PressureDecay::Gravity,
            radius: 4,
            ..Default::default()
        },
        ..Default::default()
    };
    let kernel = PressureKernel::new(&params.pressure);
    let mut index = UndevelopedIndex::default();
    let mut rng = SimRng::from_seed_u64(params.random_seed);

    let start = Instant::now();
    let mut own = [0u64; 4];
    for step in 1..=3 {
        index
            .recompute(&mut land, &regions, &model)
            .expect("recompute");
        let mut ctx = StepContext {
            land: &mut land,
            regions: &mut regions,
            index: &mut index,
            kernel: &kernel,
            params: &params,
            rng: &mut rng.0,
        };
        for (slot, report) in ctx.run_step(step, step == 3).iter().enumerate() {
            assert!(report.shortfall.is_none(), "step {step}: {report:?}");
            own[slot] += report.converted as u64;
        }
    }
    let elapsed = start.elapsed();

    let converted: usize = (1..=3).map(|s| land.count_developed_at(s)).sum();
    assert_eq!(
        converted as u64,
        own.iter().sum::<u64>() + regions.absorbed.iter().sum::<u64>()
    );
    for (slot, region) in regions.iter().enumerate() {
        let lhs = (own[slot] + regions.absorbed[slot]) as i64;
        let rhs = region.total_demand(3) as i64 + regions.overflow[slot];
        assert_eq!(lhs, rhs, "region {} not conserved", region.id);
    }

    println!(
        "3 steps, {converted} cells converted on {} cells: {}ms",
        SIDE * SIDE,
        elapsed.as_millis()
    );
    assert!(
        elapsed.as_secs() < 60,
        "Three 1M-cell steps took {}ms",
        elapsed.as_millis()
    );
}

// ---------------------------------------------------------------------------
// 3. Pressure updates touch only the kernel footprint
// ---------------------------------------------------------------------------

#[test]
fn test_pressure_updates_stay_local() {
    let dims = GridDims::new(SIDE, SIDE);
    let mut land = Landscape::open(dims);
    let kernel = PressureKernel::new(&PressureParams {
        decay: PressureDecay::Occurrence,
        radius: 10,
        gamma: 1.0,
        scaling_factor: 1.0,
    });

    // 10K conversions on a regular lattice 10 cells apart.
    let start = Instant::now();
    let mut applied = 0;
    for row in (5..SIDE).step_by(10) {
        for col in (5..SIDE).step_by(10) {
            let cell = dims.cell(row, col).expect("in grid");
            kernel.apply(&mut land, cell);
            applied += 1;
        }
    }
    let elapsed = start.elapsed();
    assert_eq!(applied, 10_000);

    // Corner cell (0, 0) is within radius 10 of only the lattice point (5, 5).
    let corner = dims.cell(0, 0).expect("in grid");
    assert_eq!(land.pressure_at(corner), 1.0);
    // Every interior cell sees the same number of lattice points.
    let a = dims.cell(500, 500).expect("in grid");
    let b = dims.cell(501, 503).expect("in grid");
    assert_eq!(land.pressure_at(a), land.pressure_at(b));

    println!("10K kernel applications (radius 10): {}ms", elapsed.as_millis());
    assert!(
        elapsed.as_secs() < 10,
        "Kernel updates took {}ms",
        elapsed.as_millis()
    );
}
