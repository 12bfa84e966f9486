use std::collections::BTreeMap;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// One subregion: its demand schedule and the patch sizes it grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i32,
    /// Cells to convert per step; index 0 is step 1.
    pub demand: Vec<u32>,
    pub patch_sizes: Vec<u32>,
}

impl Region {
    /// Demand for a 1-based step; steps past the schedule demand nothing.
    pub fn demand_at(&self, step: u32) -> u32 {
        step.checked_sub(1)
            .and_then(|i| self.demand.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_demand(&self, through_step: u32) -> u64 {
        (1..=through_step).map(|s| self.demand_at(s) as u64).sum()
    }

    pub fn sample_patch_size(&self, rng: &mut impl Rng) -> u32 {
        // Non-empty pools are enforced by `Regions::new`.
        self.patch_sizes[rng.gen_range(0..self.patch_sizes.len())]
    }
}

/// All subregions of a run, in processing order, plus their carry-over.
///
/// Regions are addressed by slot (position in processing order); `slot_of`
/// maps a subregion id from the grid to its slot.
#[derive(Resource, Debug, Clone, Default)]
pub struct Regions {
    regions: Vec<Region>,
    slots: BTreeMap<i32, usize>,
    /// Signed carry-over per slot: positive after overshooting demand,
    /// negative after falling short.
    pub overflow: Vec<i64>,
    /// Cells of each region converted by patches grown from other regions.
    pub absorbed: Vec<u64>,
}

impl Regions {
    pub fn new(regions: Vec<Region>) -> Result<Self, GrowthError> {
        let mut slots = BTreeMap::new();
        for (slot, region) in regions.iter().enumerate() {
            if region.patch_sizes.is_empty() || region.patch_sizes.contains(&0) {
                return Err(GrowthError::EmptyPatchPool { region: region.id });
            }
            if slots.insert(region.id, slot).is_some() {
                return Err(GrowthError::InvalidParameter(format!(
                    "subregion {} is listed twice",
                    region.id
                )));
            }
        }
        let n = regions.len();
        Ok(Self {
            regions,
            slots,
            overflow: vec![0; n],
            absorbed: vec![0; n],
        })
    }

    #[inline]
    pub fn slot_of(&self, id: i32) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> &Region {
        &self.regions[slot]
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn overflow_of(&self, id: i32) -> Option<i64> {
        self.slot_of(id).map(|slot| self.overflow[slot])
    }
}
