use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::step_scheduler::StepReport;

/// Per-step reports collected over the run.
#[derive(Resource, Default, Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub steps: Vec<StepReport>,
}

impl RunStats {
    pub fn record(&mut self, report: StepReport) {
        self.steps.push(report);
    }

    pub fn last(&self) -> Option<&StepReport> {
        self.steps.last()
    }

    /// Cells a region converted with its own patches over the whole run.
    pub fn converted_by(&self, region: i32) -> u64 {
        self.steps
            .iter()
            .filter_map(|s| s.region(region))
            .map(|r| r.converted as u64)
            .sum()
    }

    pub fn total_converted(&self) -> u64 {
        self.steps.iter().map(StepReport::total_converted).sum()
    }

    /// Step reports where some region fell short of its target.
    pub fn shortfalls(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.steps.iter().flat_map(|s| {
            s.regions
                .iter()
                .filter(|r| r.shortfall.is_some())
                .map(move |r| (s.step, r.region))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step_scheduler::{RegionStepReport, ShortfallReason};

    fn region_report(region: i32, converted: u32, spilled: u32) -> RegionStepReport {
        RegionStepReport {
            region,
            demand: converted,
            target: converted as i64,
            available: 100,
            converted,
            spilled,
            overflow_after: 0,
            shortfall: None,
        }
    }

    #[test]
    fn test_totals_across_steps() {
        let mut stats = RunStats::default();
        stats.record(StepReport {
            step: 1,
            year: Some(2020),
            regions: vec![region_report(1, 4, 1), region_report(2, 3, 0)],
        });
        stats.record(StepReport {
            step: 2,
            year: Some(2021),
            regions: vec![region_report(1, 2, 0), region_report(2, 5, 2)],
        });
        assert_eq!(stats.converted_by(1), 6);
        assert_eq!(stats.converted_by(2), 8);
        assert_eq!(stats.total_converted(), 17);
        assert_eq!(stats.last().map(|s| s.step), Some(2));
    }

    #[test]
    fn test_shortfalls_listed_by_step() {
        let mut stats = RunStats::default();
        let mut short = region_report(2, 0, 0);
        short.shortfall = Some(ShortfallReason::InsufficientCells);
        stats.record(StepReport {
            step: 3,
            year: None,
            regions: vec![region_report(1, 1, 0), short],
        });
        assert_eq!(stats.shortfalls().collect::<Vec<_>>(), vec![(3, 2)]);
    }
}
