//! Synthetic scenarios built from fBm noise, for demos and benchmarks when
//! no real input layers are at hand.

use std::collections::BTreeMap;

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

use crate::growth_params::GrowthParams;
use crate::probability::Coefficients;
use crate::scenario::{DemandTable, PatchSizeTable, Scenario};

const SUITABILITY_FREQUENCY: f32 = 0.02;
const SLOPE_FREQUENCY: f32 = 0.045;
const WATER_FREQUENCY: f32 = 0.012;
/// Suitability above which a cell starts out developed.
const DEVELOPED_THRESHOLD: f32 = 0.68;
/// Water noise below which a cell is outside the study area.
const WATER_THRESHOLD: f32 = 0.22;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub rows: usize,
    pub cols: usize,
    /// Subregions are a `region_rows` x `region_cols` tiling of the grid.
    pub region_rows: usize,
    pub region_cols: usize,
    pub num_steps: u32,
    /// Share of a region's undeveloped cells demanded per step.
    pub demand_share: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 128,
            cols: 128,
            region_rows: 2,
            region_cols: 2,
            num_steps: 10,
            demand_share: 0.01,
            seed: crate::config::DEFAULT_SEED,
        }
    }
}

impl SyntheticConfig {
    /// A default configuration for a `WIDTHxHEIGHT` grid, e.g. `"200x150"`.
    pub fn with_size(size: &str) -> Option<Self> {
        let (w, h) = size.split_once(['x', 'X'])?;
        let cols: usize = w.trim().parse().ok()?;
        let rows: usize = h.trim().parse().ok()?;
        if rows == 0 || cols == 0 {
            return None;
        }
        Some(Self {
            rows,
            cols,
            ..Default::default()
        })
    }

    fn region_at(&self, row: usize, col: usize) -> i32 {
        let tile_row = row * self.region_rows / self.rows;
        let tile_col = col * self.region_cols / self.cols;
        (tile_row * self.region_cols + tile_col) as i32 + 1
    }

    pub fn generate(&self) -> Scenario {
        let n = self.rows * self.cols;
        let seed = self.seed as i32;
        let suitability = noise_field(self.rows, self.cols, seed, SUITABILITY_FREQUENCY, 4);
        let slope = noise_field(self.rows, self.cols, seed.wrapping_add(7), SLOPE_FREQUENCY, 2);
        let water = noise_field(self.rows, self.cols, seed.wrapping_add(9999), WATER_FREQUENCY, 3);

        let mut developed = Vec::with_capacity(n);
        let mut subregion = Vec::with_capacity(n);
        let mut open_cells: BTreeMap<i32, u64> = BTreeMap::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let i = row * self.cols + col;
                if water[i] < WATER_THRESHOLD {
                    developed.push(None);
                    subregion.push(None);
                    continue;
                }
                let region = self.region_at(row, col);
                let is_developed = suitability[i] > DEVELOPED_THRESHOLD;
                if !is_developed {
                    *open_cells.entry(region).or_default() += 1;
                }
                developed.push(Some(is_developed as i32));
                subregion.push(Some(region));
            }
        }

        let region_count = (self.region_rows * self.region_cols) as i32;
        let mut demand = BTreeMap::new();
        let mut potential = BTreeMap::new();
        for region in 1..=region_count {
            let open = open_cells.get(&region).copied().unwrap_or(0);
            let per_step = (open as f64 * self.demand_share).round() as u32;
            demand.insert(region, vec![per_step; self.num_steps as usize]);
            potential.insert(
                region,
                Coefficients {
                    intercept: -2.5 + 0.1 * region as f64,
                    pressure: 0.08,
                    predictors: BTreeMap::from([
                        ("suitability".to_string(), 3.0),
                        ("slope".to_string(), -1.5),
                    ]),
                },
            );
        }

        let mut predictors = BTreeMap::new();
        predictors.insert(
            "suitability".to_string(),
            suitability.into_iter().map(Some).collect(),
        );
        predictors.insert("slope".to_string(), slope.into_iter().map(Some).collect());

        Scenario {
            rows: self.rows,
            cols: self.cols,
            developed,
            subregion,
            potential_subregion: None,
            weight: None,
            pressure: None,
            predictors,
            demand: DemandTable {
                years: Vec::new(),
                regions: demand,
            },
            potential,
            patch_sizes: PatchSizeTable {
                shared: Some(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 20.0]),
                regions: BTreeMap::new(),
            },
            params: GrowthParams {
                num_steps: self.num_steps,
                random_seed: self.seed,
                ..Default::default()
            },
        }
    }
}

/// fBm noise over the grid, normalized to [0, 1].
fn noise_field(rows: usize, cols: usize, seed: i32, frequency: f32, octaves: i32) -> Vec<f32> {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(frequency));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(octaves));
    noise.set_fractal_gain(Some(0.5));
    noise.set_fractal_lacunarity(Some(2.0));

    let mut values = vec![0.0_f32; rows * cols];
    for y in 0..rows {
        for x in 0..cols {
            let raw = noise.get_noise_2d(x as f32, y as f32);
            values[y * cols + x] = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);
        }
    }
    values
}
