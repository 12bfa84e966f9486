//! Data-driven run parameters.
//!
//! Everything that shapes a growth run lives in the [`GrowthParams`] resource,
//! passed by reference into the probability model, the patch grower and the
//! step scheduler. Scenario files carry a serialized copy; command-line flags
//! override individual fields on top of it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MAX_FAILED_SEEDS, DEFAULT_SEED};
use crate::error::GrowthError;

// ---------------------------------------------------------------------------
// Strategy enums
// ---------------------------------------------------------------------------

/// Cell connectivity used for patch growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    Four,
    #[default]
    Eight,
}

impl Neighborhood {
    /// Row/column offsets of the neighbors, cardinal directions first.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        const OFFSETS: [(i32, i32); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];
        match self {
            Neighborhood::Four => &OFFSETS[..4],
            Neighborhood::Eight => &OFFSETS,
        }
    }

    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            4 => Some(Neighborhood::Four),
            8 => Some(Neighborhood::Eight),
            _ => None,
        }
    }
}

/// How seeds are drawn from a region's undeveloped cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedSearch {
    /// Every undeveloped cell is equally likely.
    Random,
    /// Cells are drawn in proportion to their development probability.
    #[default]
    Probability,
}

/// Decay function for the development pressure kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PressureDecay {
    /// Each developed cell in range counts 1.
    Occurrence,
    /// `scaling_factor / distance^gamma`.
    #[default]
    Gravity,
    /// `scaling_factor * exp(-2 * distance / gamma)`.
    Kernel,
}

/// What a patch does when its candidates keep refusing to develop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StallStrategy {
    /// Accept the best-ranked candidate unconditionally.
    ForceGrow,
    /// Stop growing; the patch ends up smaller than requested.
    #[default]
    Skip,
}

// ---------------------------------------------------------------------------
// Development pressure parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureParams {
    pub decay: PressureDecay,
    /// Kernel radius in cells.
    pub radius: u32,
    /// Distance decay exponent (gravity) or bandwidth (kernel).
    pub gamma: f64,
    pub scaling_factor: f64,
}

impl Default for PressureParams {
    fn default() -> Self {
        Self {
            decay: PressureDecay::Gravity,
            radius: 10,
            gamma: 1.5,
            scaling_factor: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// GrowthParams resource
// ---------------------------------------------------------------------------

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    pub num_steps: u32,
    pub neighborhood: Neighborhood,
    /// Mean of the distance exponent; higher grows tighter patches.
    pub compactness_mean: f64,
    /// Width of the uniform interval the exponent is drawn from.
    pub compactness_range: f64,
    pub seed_search: SeedSearch,
    pub pressure: PressureParams,
    /// Exponent of the incentive transform `p^power`; `None` disables it.
    pub incentive_power: Option<f64>,
    /// Let patches overshoot demand on every step but the last.
    pub overgrow: bool,
    pub stall_strategy: StallStrategy,
    pub random_seed: u64,
    /// Export the developed layer after every step, not only at the end.
    pub output_series: bool,
    /// Scale applied to patch-size tables when a scenario is loaded.
    pub discount_factor: f64,
    pub max_failed_seeds: u64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            num_steps: 10,
            neighborhood: Neighborhood::Eight,
            compactness_mean: 0.4,
            compactness_range: 0.05,
            seed_search: SeedSearch::Probability,
            pressure: PressureParams::default(),
            incentive_power: None,
            overgrow: false,
            stall_strategy: StallStrategy::Skip,
            random_seed: DEFAULT_SEED,
            output_series: false,
            discount_factor: 1.0,
            max_failed_seeds: DEFAULT_MAX_FAILED_SEEDS,
        }
    }
}

impl GrowthParams {
    pub fn validate(&self) -> Result<(), GrowthError> {
        fn invalid(msg: String) -> Result<(), GrowthError> {
            Err(GrowthError::InvalidParameter(msg))
        }

        if self.num_steps == 0 {
            return invalid("num_steps must be at least 1".into());
        }
        if !self.compactness_mean.is_finite() || !self.compactness_range.is_finite() {
            return invalid("compactness mean and range must be finite".into());
        }
        if self.compactness_range < 0.0 {
            return invalid(format!(
                "compactness_range must be non-negative, got {}",
                self.compactness_range
            ));
        }
        if self.pressure.radius == 0 {
            return invalid("development pressure radius must be at least 1".into());
        }
        if !self.pressure.gamma.is_finite() || !self.pressure.scaling_factor.is_finite() {
            return invalid("development pressure gamma and scaling factor must be finite".into());
        }
        if self.pressure.decay == PressureDecay::Kernel && self.pressure.gamma <= 0.0 {
            return invalid(format!(
                "kernel decay needs a positive gamma, got {}",
                self.pressure.gamma
            ));
        }
        if let Some(power) = self.incentive_power {
            if !power.is_finite() || power <= 0.0 {
                return invalid(format!("incentive power must be positive, got {power}"));
            }
        }
        if !self.discount_factor.is_finite() || self.discount_factor <= 0.0 {
            return invalid(format!(
                "discount_factor must be positive, got {}",
                self.discount_factor
            ));
        }
        if self.max_failed_seeds == 0 {
            return invalid("max_failed_seeds must be at least 1".into());
        }
        Ok(())
    }
}
