//! Folds the static predictor layers into the single aggregated layer the
//! probability model reads: `sum_k coef[r][k] * predictor_k(cell)` with `r`
//! the cell's potential subregion.

use std::collections::BTreeMap;

use crate::error::GrowthError;
use crate::probability::Coefficients;
use crate::storage::{CellId, DenseLayer, GridDims, GridStorage};

/// Aggregate named predictor layers cell by cell.
///
/// `region_of` yields the potential subregion of a cell, or `None` for cells
/// outside the study area, which stay null. A cell where any predictor its
/// coefficients reference is null also comes out null.
pub fn aggregate_predictors(
    dims: GridDims,
    layers: &BTreeMap<String, DenseLayer<f32>>,
    coefficients: &BTreeMap<i32, Coefficients>,
    region_of: impl Fn(CellId) -> Option<i32>,
) -> Result<DenseLayer<f32>, GrowthError> {
    for (name, layer) in layers {
        if layer.dims() != dims {
            return Err(GrowthError::LayerSizeMismatch {
                layer: name.clone(),
                expected: dims.len(),
                found: layer.dims().len(),
            });
        }
    }
    for (region, coef) in coefficients {
        if let Some(name) = coef.predictors.keys().find(|n| !layers.contains_key(*n)) {
            return Err(GrowthError::Scenario(format!(
                "potential subregion {region} references unknown predictor '{name}'"
            )));
        }
    }

    let mut out = DenseLayer::null(dims);
    for cell in dims.cells() {
        let Some(region) = region_of(cell) else {
            continue;
        };
        let coef = coefficients
            .get(&region)
            .ok_or(GrowthError::MissingCoefficients { region })?;

        let mut sum = 0.0f64;
        let mut complete = true;
        for (name, &weight) in &coef.predictors {
            match layers.get(name).and_then(|layer| layer.get(cell)) {
                Some(v) => sum += weight * v as f64,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out.put(cell, Some(sum as f32));
        }
    }
    out.flush();
    Ok(out)
}
