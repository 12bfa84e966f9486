//! Scenario files: every input layer, table and parameter of a run in one
//! JSON document, and the loader that turns it into a validated `GrowthRun`.
//!
//! Layers are row-major arrays with `null` for cells outside the study area.
//! The `developed` layer uses `0` for undeveloped and any other value for
//! developed; the loader converts it to the run encoding (`-1` undeveloped,
//! `0` developed before the run).

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::devpressure::PressureKernel;
use crate::driver::GrowthRun;
use crate::error::GrowthError;
use crate::growth_params::GrowthParams;
use crate::landscape::{Landscape, DEVELOPED_AT_START, UNDEVELOPED};
use crate::predictors::aggregate_predictors;
use crate::probability::{Coefficients, ProbabilityModel};
use crate::regions::{Region, Regions};
use crate::storage::{CellId, CellValue, DenseLayer, GridDims, GridStorage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub rows: usize,
    pub cols: usize,
    pub developed: Vec<Option<i32>>,
    pub subregion: Vec<Option<i32>>,
    #[serde(default)]
    pub potential_subregion: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub weight: Option<Vec<Option<f32>>>,
    /// Initial development pressure. Derived from the developed layer when
    /// absent.
    #[serde(default)]
    pub pressure: Option<Vec<Option<f32>>>,
    #[serde(default)]
    pub predictors: BTreeMap<String, Vec<Option<f32>>>,
    pub demand: DemandTable,
    /// Coefficients per potential subregion.
    pub potential: BTreeMap<i32, Coefficients>,
    pub patch_sizes: PatchSizeTable,
    #[serde(default)]
    pub params: GrowthParams,
}

/// Cells to convert per step and region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandTable {
    /// Calendar year of each step, for reporting only.
    #[serde(default)]
    pub years: Vec<i32>,
    pub regions: BTreeMap<i32, Vec<u32>>,
}

/// Patch size pools, either per region or one pool shared by all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchSizeTable {
    #[serde(default)]
    pub shared: Option<Vec<f64>>,
    #[serde(default)]
    pub regions: BTreeMap<i32, Vec<f64>>,
}

impl PatchSizeTable {
    /// Pool for `region` scaled by `discount`. Sizes that round below one
    /// cell are dropped; an empty result falls back to single-cell patches.
    pub fn pool_for(&self, region: i32, discount: f64) -> Vec<u32> {
        let raw = self
            .regions
            .get(&region)
            .or(self.shared.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let pool: Vec<u32> = raw
            .iter()
            .map(|&s| (s * discount).round())
            .filter(|s| s.is_finite() && *s >= 1.0)
            .map(|s| s as u32)
            .collect();
        if pool.is_empty() {
            warn!("Region {region} has no usable patch sizes; growing single-cell patches");
            return vec![1];
        }
        pool
    }
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, GrowthError> {
        serde_json::from_str(json).map_err(|e| GrowthError::Scenario(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, GrowthError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| GrowthError::Scenario(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, GrowthError> {
        serde_json::to_string(self).map_err(|e| GrowthError::Scenario(e.to_string()))
    }

    /// Validate the scenario and assemble the run state.
    pub fn into_run(self) -> Result<GrowthRun, GrowthError> {
        let params = self.params;
        params.validate()?;
        let dims = GridDims::new(self.rows, self.cols);
        if dims.is_empty() {
            return Err(GrowthError::Scenario("grid has no cells".into()));
        }

        let subregion = option_layer("subregion", dims, self.subregion)?;
        let potential_subregion = self
            .potential_subregion
            .map(|v| option_layer("potential_subregion", dims, v))
            .transpose()?;
        let input_developed = option_layer("developed", dims, self.developed)?;
        let mut developed = study_area(dims, input_developed, &subregion);

        let mut predictor_layers = BTreeMap::new();
        for (name, values) in self.predictors {
            let layer = option_layer(&name, dims, values)?;
            predictor_layers.insert(name, layer);
        }
        let region_of = |cell: CellId| match &potential_subregion {
            Some(layer) => layer.get(cell),
            None => subregion.get(cell),
        };
        let predictor = aggregate_predictors(dims, &predictor_layers, &self.potential, |cell| {
            developed.get(cell).and(region_of(cell))
        })?;

        // Cells the probability model cannot score leave the study area.
        let mut excluded = 0usize;
        for cell in dims.cells() {
            if developed.get(cell) == Some(UNDEVELOPED)
                && (region_of(cell).is_none() || predictor.get(cell).is_none())
            {
                developed.put(cell, None);
                excluded += 1;
            }
        }
        if excluded > 0 {
            info!(
                "Excluded {excluded} undeveloped cells with a null potential subregion or predictor"
            );
        }
        developed.flush();

        let weight = self
            .weight
            .map(|v| option_layer("weight", dims, v).map(clamp_weights))
            .transpose()?;
        let supplied_pressure = self.pressure.is_some();
        let pressure = match self.pressure {
            Some(v) => option_layer("pressure", dims, v)?,
            None => DenseLayer::filled(dims, 0.0),
        };

        let mut landscape = Landscape::from_layers(
            developed,
            subregion,
            potential_subregion,
            pressure,
            predictor,
            weight,
        )?;
        if !supplied_pressure {
            PressureKernel::new(&params.pressure).seed_from_initial_development(&mut landscape);
        }

        let num_steps = params.num_steps as usize;
        let mut regions = Vec::with_capacity(self.demand.regions.len());
        for (id, mut demand) in self.demand.regions {
            if demand.len() < num_steps {
                demand.resize(num_steps, 0);
            }
            regions.push(Region {
                id,
                demand,
                patch_sizes: self.patch_sizes.pool_for(id, params.discount_factor),
            });
        }
        let regions = Regions::new(regions)?;
        for cell in dims.cells() {
            if !landscape.is_undeveloped(cell) {
                continue;
            }
            if let Some(region) = landscape.region_of(cell) {
                if regions.slot_of(region).is_none() {
                    return Err(GrowthError::UnknownRegion { region });
                }
            }
        }

        let model = ProbabilityModel::new(self.potential, params.incentive_power);
        model.check_coverage(&landscape)?;

        Ok(GrowthRun {
            landscape,
            regions,
            model,
            params,
            years: self.demand.years,
        })
    }
}

fn option_layer<T: CellValue>(
    name: &str,
    dims: GridDims,
    values: Vec<Option<T>>,
) -> Result<DenseLayer<T>, GrowthError> {
    DenseLayer::from_values(
        name,
        dims,
        values.into_iter().map(|v| v.unwrap_or(T::NULL)).collect(),
    )
}

/// Re-encode the input developed layer; cells without a subregion are
/// outside the study area.
fn study_area(
    dims: GridDims,
    input: DenseLayer<i32>,
    subregion: &DenseLayer<i32>,
) -> DenseLayer<i32> {
    let mut out = DenseLayer::null(dims);
    for cell in dims.cells() {
        if let (Some(v), Some(_)) = (input.get(cell), subregion.get(cell)) {
            out.put(cell, Some(if v == 0 { UNDEVELOPED } else { DEVELOPED_AT_START }));
        }
    }
    out
}

fn clamp_weights(mut layer: DenseLayer<f32>) -> DenseLayer<f32> {
    let mut clamped = 0usize;
    for cell in layer.dims().cells() {
        if let Some(w) = layer.get(cell) {
            if !(-1.0..=1.0).contains(&w) {
                layer.put(cell, Some(w.clamp(-1.0, 1.0)));
                clamped += 1;
            }
        }
    }
    if clamped > 0 {
        warn!("Clamped {clamped} weight values into [-1, 1]");
    }
    layer.flush();
    layer
}
