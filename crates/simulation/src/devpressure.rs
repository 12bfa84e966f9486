//! Development pressure: a precomputed decay kernel added around every newly
//! developed cell.
//!
//! The kernel covers the `(2r+1) x (2r+1)` square of offsets around a cell.
//! The converted cell itself (offset 0,0) receives nothing. Pressure only ever
//! grows; probabilities pick the change up at the next step's recompute.

use bevy::prelude::*;

use crate::growth_params::{PressureDecay, PressureParams};
use crate::landscape::{Landscape, DEVELOPED_AT_START};
use crate::storage::{CellId, GridStorage};

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PressureKernel {
    radius: i32,
    /// Row-major `(2r+1)^2` weights.
    weights: Vec<f64>,
}

impl PressureKernel {
    pub fn new(params: &PressureParams) -> Self {
        let radius = params.radius as i32;
        let size = (2 * radius + 1) as usize;
        let mut weights = Vec::with_capacity(size * size);
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                weights.push(decay_weight(params, dr, dc));
            }
        }
        Self { radius, weights }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Contribution at offset `(dr, dc)`; zero outside the kernel.
    pub fn weight(&self, dr: i32, dc: i32) -> f64 {
        if dr.abs() > self.radius || dc.abs() > self.radius {
            return 0.0;
        }
        let size = 2 * self.radius + 1;
        self.weights[((dr + self.radius) * size + (dc + self.radius)) as usize]
    }

    /// Add the kernel around a newly developed cell. Off-grid offsets and
    /// cells whose pressure is null are skipped.
    pub fn apply(&self, land: &mut Landscape, cell: CellId) {
        let dims = land.dims();
        for dr in -self.radius..=self.radius {
            for dc in -self.radius..=self.radius {
                let w = self.weight(dr, dc);
                if w == 0.0 {
                    continue;
                }
                let Some(target) = dims.offset(cell, dr, dc) else {
                    continue;
                };
                if let Some(current) = land.pressure.get(target) {
                    land.pressure.put(target, Some(current + w as f32));
                }
            }
        }
    }

    /// Build pressure from scratch for cells developed before the run starts.
    pub fn seed_from_initial_development(&self, land: &mut Landscape) {
        let initial: Vec<CellId> = land
            .dims()
            .cells()
            .filter(|&c| land.developed_at(c) == Some(DEVELOPED_AT_START))
            .collect();
        for cell in initial {
            self.apply(land, cell);
        }
        land.pressure.flush();
    }
}

fn decay_weight(params: &PressureParams, dr: i32, dc: i32) -> f64 {
    if dr == 0 && dc == 0 {
        return 0.0;
    }
    let dist = ((dr * dr + dc * dc) as f64).sqrt();
    match params.decay {
        PressureDecay::Occurrence => 1.0,
        PressureDecay::Gravity => params.scaling_factor / dist.powf(params.gamma),
        PressureDecay::Kernel => params.scaling_factor * (-2.0 * dist / params.gamma).exp(),
    }
}
