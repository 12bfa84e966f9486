//! Per-step, per-region demand satisfaction.
//!
//! Regions run one after another on the shared landscape. Each region draws
//! seeds from its undeveloped-cell bucket, challenges them against their
//! probability and grows a patch from every accepted seed until its demand
//! for the step is met. Over- and under-conversion is carried into the next
//! step through `Regions::overflow`.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MAX_SEED_ITER;
use crate::devpressure::PressureKernel;
use crate::growth_params::GrowthParams;
use crate::landscape::Landscape;
use crate::patch_growth::grow_patch;
use crate::regions::Regions;
use crate::seed_search::select_seed;
use crate::storage::CellId;
use crate::undeveloped_index::UndevelopedIndex;

/// Why a region converted less than it was asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallReason {
    /// Fewer undeveloped cells than the step's target.
    InsufficientCells,
    /// Too many seed attempts failed; the rest of the demand was dropped.
    TooManyFailedSeeds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStepReport {
    pub region: i32,
    pub demand: u32,
    /// Demand adjusted by the overflow carried in from earlier steps.
    pub target: i64,
    /// Bucket size at the start of the step.
    pub available: usize,
    /// Cells converted inside the region by its own patches.
    pub converted: u32,
    /// Cells converted in other regions by this region's patches.
    pub spilled: u32,
    pub overflow_after: i64,
    pub shortfall: Option<ShortfallReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u32,
    pub year: Option<i32>,
    pub regions: Vec<RegionStepReport>,
}

impl StepReport {
    /// Every cell converted during the step, wherever it lies.
    pub fn total_converted(&self) -> u64 {
        self.regions
            .iter()
            .map(|r| r.converted as u64 + r.spilled as u64)
            .sum()
    }

    pub fn region(&self, id: i32) -> Option<&RegionStepReport> {
        self.regions.iter().find(|r| r.region == id)
    }
}

/// Mutable state one step works on.
pub struct StepContext<'a, R: Rng> {
    pub land: &'a mut Landscape,
    pub regions: &'a mut Regions,
    pub index: &'a mut UndevelopedIndex,
    pub kernel: &'a PressureKernel,
    pub params: &'a GrowthParams,
    pub rng: &'a mut R,
}

impl<R: Rng> StepContext<'_, R> {
    /// Run all regions for `step` in slot order. The undeveloped index must
    /// have been recomputed for this step.
    pub fn run_step(&mut self, step: u32, is_last: bool) -> Vec<RegionStepReport> {
        (0..self.regions.len())
            .map(|slot| self.run_region(slot, step, is_last))
            .collect()
    }

    fn run_region(&mut self, slot: usize, step: u32, is_last: bool) -> RegionStepReport {
        let region = self.regions.get(slot);
        let id = region.id;
        let demand = region.demand_at(step);

        let prior = std::mem::take(&mut self.regions.overflow[slot]);
        let raw = demand as i64 - prior;
        let (target, carried) = if raw < 0 { (0, -raw) } else { (raw, 0) };
        let available = self.index.bucket(slot).len();

        let mut report = RegionStepReport {
            region: id,
            demand,
            target,
            available,
            converted: 0,
            spilled: 0,
            overflow_after: 0,
            shortfall: None,
        };

        let mut done = 0;
        if target > 0 {
            let forced = target >= available as i64;
            if forced {
                warn!(
                    "Step {step}, region {id}: target of {target} cells needs all {available} \
                     undeveloped cells; converting every one of them"
                );
                if target > available as i64 {
                    report.shortfall = Some(ShortfallReason::InsufficientCells);
                }
            }
            let limit = target.min(available as i64);
            done = self.convert_seeds(slot, id, limit, forced, step, is_last, &mut report);
            if forced && done < limit {
                done += self.convert_remaining(slot, id, limit - done, step, is_last, &mut report);
            }
        }

        self.regions.overflow[slot] += carried + done - target;
        report.converted = done as u32;
        report.overflow_after = self.regions.overflow[slot];
        report
    }

    /// Draw seeds until `target` cells are converted or the unsuccessful
    /// attempt count passes `max_failed_seeds`. Tried seeds are skipped until
    /// the count passes `MAX_SEED_ITER * target`. Forced seeds skip the
    /// probability challenge.
    #[allow(clippy::too_many_arguments)]
    fn convert_seeds(
        &mut self,
        slot: usize,
        id: i32,
        target: i64,
        forced: bool,
        step: u32,
        is_last: bool,
        report: &mut RegionStepReport,
    ) -> i64 {
        let retry_after = MAX_SEED_ITER * target as u64;
        let mut done = 0;
        let mut unsuccessful = 0u64;

        while done < target {
            if unsuccessful > self.params.max_failed_seeds {
                if !forced {
                    warn!(
                        "Step {step}, region {id}: giving up after {unsuccessful} unsuccessful \
                         seed attempts; {done} of {target} cells converted"
                    );
                    report.shortfall = Some(ShortfallReason::TooManyFailedSeeds);
                }
                break;
            }
            let allow_retried = unsuccessful > retry_after;

            let strategy = self.params.seed_search;
            let Some(i) = select_seed(self.index.bucket(slot), strategy, &mut *self.rng) else {
                break;
            };
            let entry = self.index.bucket(slot).get(i);
            if entry.tried && !allow_retried {
                unsuccessful += 1;
                continue;
            }
            self.index.bucket_mut(slot).mark_tried(i);

            // A patch from another region may have taken the cell this step.
            if !self.land.is_undeveloped(entry.cell) {
                unsuccessful += 1;
                continue;
            }
            if !forced && self.rng.gen::<f64>() >= entry.probability {
                unsuccessful += 1;
                continue;
            }

            done += self.grow_from_seed(slot, id, entry.cell, target - done, step, is_last, report);
        }
        done
    }

    /// Scarce supply: walk the bucket and grow from every cell still
    /// undeveloped, including those the seed search cannot reach.
    fn convert_remaining(
        &mut self,
        slot: usize,
        id: i32,
        limit: i64,
        step: u32,
        is_last: bool,
        report: &mut RegionStepReport,
    ) -> i64 {
        let mut done = 0;
        for i in 0..self.index.bucket(slot).len() {
            if done >= limit {
                break;
            }
            let entry = self.index.bucket(slot).get(i);
            if !self.land.is_undeveloped(entry.cell) {
                continue;
            }
            self.index.bucket_mut(slot).mark_tried(i);
            done += self.grow_from_seed(slot, id, entry.cell, limit - done, step, is_last, report);
        }
        done
    }

    /// Grow one patch and return the cells it converted inside the region.
    #[allow(clippy::too_many_arguments)]
    fn grow_from_seed(
        &mut self,
        slot: usize,
        id: i32,
        seed: CellId,
        remaining: i64,
        step: u32,
        is_last: bool,
        report: &mut RegionStepReport,
    ) -> i64 {
        let mut size = self.regions.get(slot).sample_patch_size(&mut *self.rng);
        if !self.params.overgrow || is_last {
            size = size.min(u32::try_from(remaining.max(1)).unwrap_or(u32::MAX));
        }

        let outcome = grow_patch(
            &mut *self.land,
            self.params,
            seed,
            size,
            step,
            id,
            &mut *self.rng,
        );
        for &cell in &outcome.converted {
            self.kernel.apply(&mut *self.land, cell);
        }
        for &(other, n) in &outcome.crossings {
            if let Some(other_slot) = self.regions.slot_of(other) {
                self.regions.overflow[other_slot] += n as i64;
                self.regions.absorbed[other_slot] += n as u64;
            }
        }
        report.spilled += outcome.crossed_total();
        outcome.in_region as i64
    }
}
