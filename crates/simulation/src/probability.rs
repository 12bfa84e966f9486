//! Per-cell logistic development probability.
//!
//! ```text
//! logit = intercept[r] + pressure_coef[r] * pressure + aggregated_predictor
//! p     = 1 / (1 + e^-logit)
//! ```
//!
//! `r` is the cell's potential subregion. The result is optionally remapped
//! through the incentive table and then adjusted by the scenario weight.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::INCENTIVE_TABLE_SIZE;
use crate::error::GrowthError;
use crate::landscape::Landscape;
use crate::storage::CellId;

/// Coefficients of one potential subregion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub intercept: f64,
    /// Coefficient on development pressure.
    pub pressure: f64,
    /// Coefficients on static predictor layers, keyed by layer name. Already
    /// folded into the aggregated predictor layer once a run is loaded.
    #[serde(default)]
    pub predictors: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Incentive transform
// ---------------------------------------------------------------------------

/// `p^power` tabulated over `[0, 1]`. Powers below 1 push probabilities up
/// (sprawl), powers above 1 push them down everywhere but at high values
/// (infill).
#[derive(Debug, Clone, PartialEq)]
pub struct IncentiveTable {
    values: Vec<f64>,
}

impl IncentiveTable {
    pub fn new(power: f64) -> Self {
        Self::with_size(power, INCENTIVE_TABLE_SIZE)
    }

    pub fn with_size(power: f64, size: usize) -> Self {
        let size = size.max(2);
        let step = 1.0 / (size - 1) as f64;
        let values = (0..size).map(|i| (i as f64 * step).powf(power)).collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn lookup(&self, probability: f64) -> Result<f64, GrowthError> {
        let size = self.values.len();
        let scaled = (probability * (size - 1) as f64).round();
        if !scaled.is_finite() || scaled < 0.0 || scaled > (size - 1) as f64 {
            return Err(GrowthError::InvalidIncentiveIndex {
                index: if scaled.is_finite() { scaled as i64 } else { -1 },
                size,
            });
        }
        Ok(self.values[scaled as usize])
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

#[inline]
pub fn logistic(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

/// Scenario weight adjustment. Negative weights scale the probability down
/// by `1 - |w|`; positive weights blend it towards 1 and never exceed it.
#[inline]
pub fn apply_weight(probability: f64, weight: f64) -> f64 {
    if weight < 0.0 {
        probability * (1.0 - weight.abs())
    } else if weight > 0.0 {
        probability + weight - probability * weight
    } else {
        probability
    }
}

// ---------------------------------------------------------------------------
// ProbabilityModel resource
// ---------------------------------------------------------------------------

#[derive(Resource, Debug, Clone, Default)]
pub struct ProbabilityModel {
    coefficients: BTreeMap<i32, Coefficients>,
    incentive: Option<IncentiveTable>,
}

impl ProbabilityModel {
    pub fn new(coefficients: BTreeMap<i32, Coefficients>, incentive_power: Option<f64>) -> Self {
        Self {
            coefficients,
            incentive: incentive_power.map(IncentiveTable::new),
        }
    }

    pub fn coefficients_for(&self, region: i32) -> Result<&Coefficients, GrowthError> {
        self.coefficients
            .get(&region)
            .ok_or(GrowthError::MissingCoefficients { region })
    }

    pub fn incentive(&self) -> Option<&IncentiveTable> {
        self.incentive.as_ref()
    }

    /// Every cell that can still develop must have coefficients for its
    /// potential subregion.
    pub fn check_coverage(&self, land: &Landscape) -> Result<(), GrowthError> {
        for cell in land.dims().cells() {
            if !land.is_undeveloped(cell) {
                continue;
            }
            if let Some(region) = land.potential_region_of(cell) {
                self.coefficients_for(region)?;
            }
        }
        Ok(())
    }

    /// Development probability of `cell` from the currently stored layers.
    pub fn probability(&self, land: &Landscape, cell: CellId) -> Result<f64, GrowthError> {
        let region = land
            .potential_region_of(cell)
            .ok_or(GrowthError::MissingCoefficients { region: i32::MIN })?;
        let coef = self.coefficients_for(region)?;
        let logit =
            coef.intercept + coef.pressure * land.pressure_at(cell) + land.predictor_at(cell);
        let mut p = logistic(logit);
        if let Some(table) = &self.incentive {
            p = table.lookup(p)?;
        }
        Ok(apply_weight(p, land.weight_at(cell)))
    }
}
