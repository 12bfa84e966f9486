//! Per-region pool of undeveloped cells with cumulative probabilities.
//!
//! Rebuilt once at the start of every step in a single pass over the grid.
//! The pool goes stale as soon as the first cell of the step converts; users
//! re-check `Landscape::is_undeveloped` before acting on an entry.

use bevy::prelude::*;

use crate::config::{BUCKET_GROWTH_FACTOR, BUCKET_INITIAL_CAPACITY};
use crate::error::GrowthError;
use crate::landscape::Landscape;
use crate::probability::ProbabilityModel;
use crate::regions::Regions;
use crate::storage::{CellId, GridStorage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UndevelopedCell {
    pub cell: CellId,
    pub probability: f64,
    /// Normalized running sum; the last entry of a bucket is exactly 1.
    pub cumulative: f64,
    /// Already drawn as a seed this step.
    pub tried: bool,
}

/// Undeveloped cells of one region.
#[derive(Debug, Clone, Default)]
pub struct CellBucket {
    entries: Vec<UndevelopedCell>,
}

impl CellBucket {
    fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, cell: CellId, probability: f64) {
        if self.entries.len() == self.entries.capacity() {
            let cap = self.entries.capacity();
            let grown = ((cap as f64) * BUCKET_GROWTH_FACTOR) as usize;
            let additional = (grown - cap).max(BUCKET_INITIAL_CAPACITY);
            self.entries.reserve_exact(additional);
        }
        self.entries.push(UndevelopedCell {
            cell,
            probability,
            cumulative: 0.0,
            tried: false,
        });
    }

    /// Turn probabilities into a normalized cumulative distribution. A bucket
    /// whose cells all have zero probability gets a uniform distribution so
    /// the weighted search still covers every entry.
    fn normalize(&mut self) {
        let n = self.entries.len();
        if n == 0 {
            return;
        }
        let mut running = 0.0;
        for entry in &mut self.entries {
            running += entry.probability;
            entry.cumulative = running;
        }
        if running > 0.0 {
            for entry in &mut self.entries {
                entry.cumulative /= running;
            }
        } else {
            for (i, entry) in self.entries.iter_mut().enumerate() {
                entry.cumulative = (i + 1) as f64 / n as f64;
            }
        }
        self.entries[n - 1].cumulative = 1.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[UndevelopedCell] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, i: usize) -> UndevelopedCell {
        self.entries[i]
    }

    #[inline]
    pub fn mark_tried(&mut self, i: usize) {
        self.entries[i].tried = true;
    }
}

/// Buckets indexed by region slot (see `Regions::slot_of`).
#[derive(Resource, Debug, Clone, Default)]
pub struct UndevelopedIndex {
    buckets: Vec<CellBucket>,
}

impl UndevelopedIndex {
    /// Score every undeveloped cell, write its probability into the
    /// landscape's probability layer and file it under its region.
    pub fn recompute(
        &mut self,
        land: &mut Landscape,
        regions: &Regions,
        model: &ProbabilityModel,
    ) -> Result<(), GrowthError> {
        self.buckets.resize_with(regions.len(), CellBucket::default);
        for bucket in &mut self.buckets {
            bucket.clear();
        }

        for cell in land.dims().cells() {
            if !land.is_undeveloped(cell) {
                continue;
            }
            let Some(region) = land.region_of(cell) else {
                continue;
            };
            let slot = regions
                .slot_of(region)
                .ok_or(GrowthError::UnknownRegion { region })?;
            let p = model.probability(land, cell)?;
            land.probability.put(cell, Some(p as f32));
            self.buckets[slot].push(cell, p);
        }
        land.probability.flush();

        for bucket in &mut self.buckets {
            bucket.normalize();
        }
        Ok(())
    }

    pub fn bucket(&self, slot: usize) -> &CellBucket {
        &self.buckets[slot]
    }

    pub fn bucket_mut(&mut self, slot: usize) -> &mut CellBucket {
        &mut self.buckets[slot]
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::probability::Coefficients;
    use crate::regions::Region;
    use crate::storage::{DenseLayer, GridDims};

    fn setup() -> (Landscape, Regions, ProbabilityModel) {
        let dims = GridDims::new(4, 4);
        let mut land = Landscape::open(dims);
        // Left half region 1, right half region 2.
        for cell in dims.cells() {
            let (_, col) = dims.row_col(cell);
            land.subregion.put(cell, Some(if col < 2 { 1 } else { 2 }));
            land.predictor.put(cell, Some(col as f32 * 0.5 - 1.0));
        }
        let regions = Regions::new(vec![
            Region {
                id: 1,
                demand: vec![1],
                patch_sizes: vec![1],
            },
            Region {
                id: 2,
                demand: vec![1],
                patch_sizes: vec![1],
            },
        ])
        .unwrap();
        let mut coefficients = BTreeMap::new();
        for id in [1, 2] {
            coefficients.insert(
                id,
                Coefficients {
                    intercept: 0.0,
                    pressure: 0.0,
                    predictors: BTreeMap::new(),
                },
            );
        }
        (land, regions, ProbabilityModel::new(coefficients, None))
    }

    #[test]
    fn test_cumulative_is_monotonic_and_ends_at_one() {
        let (mut land, regions, model) = setup();
        let mut index = UndevelopedIndex::default();
        index.recompute(&mut land, &regions, &model).unwrap();
        for slot in 0..regions.len() {
            let entries = index.bucket(slot).entries();
            assert_eq!(entries.len(), 8);
            for pair in entries.windows(2) {
                assert!(pair[0].cumulative <= pair[1].cumulative);
            }
            assert_eq!(entries.last().unwrap().cumulative, 1.0);
        }
    }

    #[test]
    fn test_recompute_skips_developed_and_excluded() {
        let (mut land, regions, model) = setup();
        let dims = land.dims();
        land.mark_developed(dims.cell(0, 0).unwrap(), 1);
        land.developed.put(dims.cell(1, 0).unwrap(), None);
        let mut index = UndevelopedIndex::default();
        index.recompute(&mut land, &regions, &model).unwrap();
        assert_eq!(index.bucket(0).len(), 6);
        assert_eq!(index.bucket(1).len(), 8);
        assert_eq!(land.developed_at(dims.cell(0, 0).unwrap()), Some(1));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let (mut land, regions, model) = setup();
        let mut a = UndevelopedIndex::default();
        let mut b = UndevelopedIndex::default();
        a.recompute(&mut land, &regions, &model).unwrap();
        b.recompute(&mut land, &regions, &model).unwrap();
        b.recompute(&mut land, &regions, &model).unwrap();
        for slot in 0..regions.len() {
            assert_eq!(a.bucket(slot).entries(), b.bucket(slot).entries());
        }
    }

    #[test]
    fn test_probability_layer_written() {
        let (mut land, regions, model) = setup();
        let mut index = UndevelopedIndex::default();
        index.recompute(&mut land, &regions, &model).unwrap();
        let cell = land.dims().cell(2, 3).unwrap();
        let expected = model.probability(&land, cell).unwrap();
        assert!((land.probability_at(cell) - expected).abs() < 1e-6);
        assert!(!land.probability.is_dirty());
    }

    #[test]
    fn test_zero_probability_bucket_is_uniform() {
        let (mut land, regions, model) = setup();
        land.weight = Some(DenseLayer::filled(land.dims(), -1.0));
        let mut index = UndevelopedIndex::default();
        index.recompute(&mut land, &regions, &model).unwrap();
        let entries = index.bucket(0).entries();
        assert!(entries.iter().all(|e| e.probability == 0.0));
        assert!((entries[3].cumulative - 0.5).abs() < 1e-12);
        assert_eq!(entries[7].cumulative, 1.0);
    }

    #[test]
    fn test_unknown_region_is_fatal() {
        let (mut land, regions, model) = setup();
        let cell = land.dims().cell(3, 3).unwrap();
        land.subregion.put(cell, Some(42));
        let mut index = UndevelopedIndex::default();
        assert_eq!(
            index.recompute(&mut land, &regions, &model),
            Err(GrowthError::UnknownRegion { region: 42 })
        );
    }

    #[test]
    fn test_bucket_growth_keeps_entries() {
        let mut bucket = CellBucket::default();
        let dims = GridDims::new(100, 100);
        for cell in dims.cells() {
            bucket.push(cell, 0.5);
        }
        assert_eq!(bucket.len(), 10_000);
        assert_eq!(bucket.get(9_999).cell, dims.cell(99, 99).unwrap());
    }
}
