//! Stochastic flood-fill that grows one contiguous patch from a seed.
//!
//! Candidates (undeveloped neighbors of the patch) are ranked by
//! `probability / distance_to_seed^alpha`. Each pass walks the ranking and
//! accepts the first candidate whose uniform draw falls below its raw
//! probability; the ranking only decides who gets asked first. `alpha` is
//! drawn per patch from the compactness interval, so low values let patches
//! sprawl and high values keep them tight around the seed.

use std::collections::HashSet;

use rand::Rng;

use crate::config::MAX_CANDIDATE_ITER;
use crate::growth_params::{GrowthParams, StallStrategy};
use crate::landscape::Landscape;
use crate::storage::CellId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    cell: CellId,
    probability: f64,
    suitability: f64,
}

/// Cells converted by one growth call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchOutcome {
    /// Converted cells inside the growing region, seed included.
    pub in_region: u32,
    /// Cells converted in other regions, as `(region id, count)`.
    pub crossings: Vec<(i32, u32)>,
    /// Every cell converted, in conversion order.
    pub converted: Vec<CellId>,
}

impl PatchOutcome {
    fn record_crossing(&mut self, region: i32) {
        match self.crossings.iter_mut().find(|(r, _)| *r == region) {
            Some((_, n)) => *n += 1,
            None => self.crossings.push((region, 1)),
        }
    }

    pub fn crossed_total(&self) -> u32 {
        self.crossings.iter().map(|(_, n)| n).sum()
    }
}

/// Draw the distance exponent uniformly from `[mean - range/2, mean + range/2)`.
pub fn draw_alpha(params: &GrowthParams, rng: &mut impl Rng) -> f64 {
    let half = params.compactness_range / 2.0;
    if half <= 0.0 {
        return params.compactness_mean;
    }
    rng.gen_range(params.compactness_mean - half..params.compactness_mean + half)
}

struct PatchGrower<'a> {
    land: &'a mut Landscape,
    params: &'a GrowthParams,
    seed: CellId,
    seed_rc: (f64, f64),
    alpha: f64,
    candidates: Vec<Candidate>,
    /// Cells ever added as candidates during this call.
    seen: HashSet<CellId>,
}

impl PatchGrower<'_> {
    fn suitability(&self, cell: CellId, probability: f64) -> f64 {
        let (r, c) = self.land.dims().row_col(cell);
        let dr = r as f64 - self.seed_rc.0;
        let dc = c as f64 - self.seed_rc.1;
        let dist = (dr * dr + dc * dc).sqrt();
        probability / dist.powf(self.alpha)
    }

    fn add_neighbors(&mut self, cell: CellId) {
        let (neighbors, count) = self.land.neighbors(cell, self.params.neighborhood);
        let mut added = false;
        for &n in &neighbors[..count] {
            if n == self.seed || !self.land.is_undeveloped(n) || !self.seen.insert(n) {
                continue;
            }
            let probability = self.land.probability_at(n);
            let suitability = self.suitability(n, probability);
            self.candidates.push(Candidate {
                cell: n,
                probability,
                suitability,
            });
            added = true;
        }
        if added {
            // Stable, so equally suitable cells keep discovery order.
            self.candidates
                .sort_by(|a, b| b.suitability.total_cmp(&a.suitability));
        }
    }

    fn next_acceptance(&self, rng: &mut impl Rng) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| rng.gen::<f64>() < c.probability)
    }
}

/// Grow a patch of up to `target` cells in `region` from `seed` at `step`.
///
/// The seed must be undeveloped; it is converted unconditionally. Candidates
/// in other regions may be converted too; they are reported in
/// `PatchOutcome::crossings` and do not count towards `target`.
pub fn grow_patch(
    land: &mut Landscape,
    params: &GrowthParams,
    seed: CellId,
    target: u32,
    step: u32,
    region: i32,
    rng: &mut impl Rng,
) -> PatchOutcome {
    let mut outcome = PatchOutcome::default();
    if target == 0 || !land.mark_developed(seed, step) {
        return outcome;
    }
    outcome.converted.push(seed);
    outcome.in_region = 1;

    let (sr, sc) = land.dims().row_col(seed);
    let alpha = draw_alpha(params, rng);
    let mut grower = PatchGrower {
        land,
        params,
        seed,
        seed_rc: (sr as f64, sc as f64),
        alpha,
        candidates: Vec::new(),
        seen: HashSet::new(),
    };
    grower.add_neighbors(seed);

    let mut stalled = 0u32;
    while outcome.in_region < target && !grower.candidates.is_empty() {
        let accepted = match grower.next_acceptance(rng) {
            Some(i) => i,
            None => {
                stalled += 1;
                if stalled < MAX_CANDIDATE_ITER {
                    continue;
                }
                match params.stall_strategy {
                    StallStrategy::ForceGrow => 0,
                    StallStrategy::Skip => break,
                }
            }
        };
        stalled = 0;

        let candidate = grower.candidates.remove(accepted);
        if !grower.land.mark_developed(candidate.cell, step) {
            continue;
        }
        outcome.converted.push(candidate.cell);
        match grower.land.region_of(candidate.cell) {
            Some(r) if r == region => outcome.in_region += 1,
            Some(other) => outcome.record_crossing(other),
            None => {}
        }
        grower.add_neighbors(candidate.cell);
    }
    outcome
}
