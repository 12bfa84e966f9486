//! End-of-run JSON outputs: the run summary and the color table for the
//! developed layer.

use serde::{Deserialize, Serialize};

use simulation::growth_params::GrowthParams;
use simulation::landscape::Landscape;
use simulation::regions::Regions;
use simulation::stats::RunStats;
use simulation::step_scheduler::StepReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: i32,
    pub total_demand: u64,
    /// Cells converted by the region's own patches.
    pub converted: u64,
    /// Cells converted by patches grown from other regions.
    pub absorbed: u64,
    pub overflow: i64,
    pub undeveloped_left: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps_completed: u32,
    pub random_seed: u64,
    pub converted_total: u64,
    pub regions: Vec<RegionSummary>,
    pub steps: Vec<StepReport>,
}

impl RunSummary {
    pub fn collect(
        land: &Landscape,
        regions: &Regions,
        stats: &RunStats,
        params: &GrowthParams,
        steps_completed: u32,
    ) -> Self {
        let summaries = regions
            .iter()
            .enumerate()
            .map(|(slot, region)| RegionSummary {
                region: region.id,
                total_demand: region.total_demand(steps_completed),
                converted: stats.converted_by(region.id),
                absorbed: regions.absorbed[slot],
                overflow: regions.overflow[slot],
                undeveloped_left: land.count_undeveloped_in(region.id),
            })
            .collect();
        Self {
            steps_completed,
            random_seed: params.random_seed,
            converted_total: stats.total_converted(),
            regions: summaries,
            steps: stats.steps.clone(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Color table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    pub value: i32,
    pub rgb: [u8; 3],
}

/// Colors per developed-layer value. Null cells are left transparent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    pub rules: Vec<ColorRule>,
}

const UNDEVELOPED_RGB: [u8; 3] = [180, 180, 180];
const INITIAL_RGB: [u8; 3] = [90, 90, 90];
const FIRST_STEP_RGB: [u8; 3] = [255, 230, 0];
const LAST_STEP_RGB: [u8; 3] = [200, 0, 0];

impl ColorTable {
    /// Gray for undeveloped and initially developed cells, then a
    /// yellow-to-red ramp over steps `1..=num_steps`.
    pub fn for_steps(num_steps: u32) -> Self {
        let mut rules = vec![
            ColorRule {
                value: -1,
                rgb: UNDEVELOPED_RGB,
            },
            ColorRule {
                value: 0,
                rgb: INITIAL_RGB,
            },
        ];
        let span = num_steps.saturating_sub(1).max(1) as f32;
        for step in 1..=num_steps {
            let t = (step - 1) as f32 / span;
            let mut rgb = [0u8; 3];
            for (c, out) in rgb.iter_mut().enumerate() {
                let a = FIRST_STEP_RGB[c] as f32;
                let b = LAST_STEP_RGB[c] as f32;
                *out = (a + (b - a) * t).round() as u8;
            }
            rules.push(ColorRule {
                value: step as i32,
                rgb,
            });
        }
        Self { rules }
    }

    pub fn color_of(&self, value: i32) -> Option<[u8; 3]> {
        self.rules.iter().find(|r| r.value == value).map(|r| r.rgb)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::regions::Region;
    use simulation::step_scheduler::RegionStepReport;
    use simulation::storage::GridDims;

    #[test]
    fn test_color_ramp_endpoints() {
        let table = ColorTable::for_steps(5);
        assert_eq!(table.rules.len(), 7);
        assert_eq!(table.color_of(-1), Some(UNDEVELOPED_RGB));
        assert_eq!(table.color_of(0), Some(INITIAL_RGB));
        assert_eq!(table.color_of(1), Some(FIRST_STEP_RGB));
        assert_eq!(table.color_of(5), Some(LAST_STEP_RGB));
        assert_eq!(table.color_of(6), None);
    }

    #[test]
    fn test_single_step_ramp() {
        let table = ColorTable::for_steps(1);
        assert_eq!(table.color_of(1), Some(FIRST_STEP_RGB));
    }

    #[test]
    fn test_summary_collects_region_totals() {
        let mut land = Landscape::open(GridDims::new(2, 2));
        let cell = land.dims().cell(0, 0).unwrap();
        land.mark_developed(cell, 1);
        let mut regions = Regions::new(vec![Region {
            id: 1,
            demand: vec![2, 2],
            patch_sizes: vec![1],
        }])
        .unwrap();
        regions.overflow[0] = -1;

        let mut stats = RunStats::default();
        stats.record(StepReport {
            step: 1,
            year: None,
            regions: vec![RegionStepReport {
                region: 1,
                demand: 2,
                target: 2,
                available: 4,
                converted: 1,
                spilled: 0,
                overflow_after: -1,
                shortfall: None,
            }],
        });

        let summary = RunSummary::collect(&land, &regions, &stats, &GrowthParams::default(), 1);
        assert_eq!(summary.converted_total, 1);
        assert_eq!(
            summary.regions,
            vec![RegionSummary {
                region: 1,
                total_demand: 2,
                converted: 1,
                absorbed: 0,
                overflow: -1,
                undeveloped_left: 3,
            }]
        );

        let json: serde_json::Value = serde_json::from_slice(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["steps_completed"], 1);
        assert_eq!(json["steps"][0]["regions"][0]["converted"], 1);
    }
}
