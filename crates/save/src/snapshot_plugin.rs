//! Writes run output as the simulation advances.
//!
//! Listens for `StepCompleted` in `GrowthSet::Export`. With
//! `GrowthParams::output_series` every step gets its own
//! `developed_NNN.ftrs`; the final step always writes `developed.ftrs`,
//! `summary.json` and `colors.json`. A failed write stops the run.

use std::path::{Path, PathBuf};

use bevy::prelude::*;

use simulation::driver::{RunStatus, StepClock, StepCompleted};
use simulation::growth_params::GrowthParams;
use simulation::landscape::Landscape;
use simulation::regions::Regions;
use simulation::stats::RunStats;
use simulation::GrowthSet;

use crate::atomic_write::atomic_write;
use crate::save_error::SaveError;
use crate::snapshot::{write_snapshot, DevelopedSnapshot};
use crate::summary::{ColorTable, RunSummary};

/// Where output files go.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Paths written so far, in order.
#[derive(Resource, Debug, Default)]
pub struct ExportLog {
    pub written: Vec<PathBuf>,
}

pub fn series_file_name(step: u32) -> String {
    format!("developed_{step:03}.ftrs")
}

pub const FINAL_SNAPSHOT: &str = "developed.ftrs";
pub const SUMMARY_FILE: &str = "summary.json";
pub const COLORS_FILE: &str = "colors.json";

pub struct SnapshotPlugin;

impl Plugin for SnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SnapshotConfig>()
            .init_resource::<ExportLog>()
            .add_systems(Update, export_step_output.in_set(GrowthSet::Export));
    }
}

/// Borrowed view of the run state the exporter reads.
struct RunView<'a> {
    land: &'a Landscape,
    regions: &'a Regions,
    stats: &'a RunStats,
    params: &'a GrowthParams,
    total_steps: u32,
}

fn require<'a, T>(res: &'a Option<Res<T>>, name: &str) -> Result<&'a T, SaveError>
where
    T: Resource,
{
    res.as_deref()
        .ok_or_else(|| SaveError::MissingResource(name.to_string()))
}

fn run_view<'a>(
    land: &'a Option<Res<Landscape>>,
    regions: &'a Option<Res<Regions>>,
    stats: &'a Option<Res<RunStats>>,
    params: &'a Option<Res<GrowthParams>>,
    total_steps: u32,
) -> Result<RunView<'a>, SaveError> {
    Ok(RunView {
        land: require(land, "Landscape")?,
        regions: require(regions, "Regions")?,
        stats: require(stats, "RunStats")?,
        params: require(params, "GrowthParams")?,
        total_steps,
    })
}

#[allow(clippy::too_many_arguments)]
fn export_step_output(
    mut events: EventReader<StepCompleted>,
    config: Res<SnapshotConfig>,
    land: Option<Res<Landscape>>,
    regions: Option<Res<Regions>>,
    stats: Option<Res<RunStats>>,
    params: Option<Res<GrowthParams>>,
    clock: Option<Res<StepClock>>,
    mut status: ResMut<RunStatus>,
    mut log: ResMut<ExportLog>,
) {
    for event in events.read() {
        let total_steps = clock.as_deref().map_or(event.step, |c| c.total);
        let result = run_view(&land, &regions, &stats, &params, total_steps)
            .and_then(|view| export_event(event, &config.dir, &view, &mut log.written));

        match result {
            Ok(()) if event.is_last => {
                info!("Run output written to {}", config.dir.display());
            }
            Ok(()) => {}
            Err(e) => {
                error!("Failed to export step {} output: {e}", event.step);
                *status = RunStatus::Failed(e.to_string());
            }
        }
    }
}

fn export_event(
    event: &StepCompleted,
    dir: &Path,
    view: &RunView,
    written: &mut Vec<PathBuf>,
) -> Result<(), SaveError> {
    let snapshot = DevelopedSnapshot::from_landscape(view.land, event.step, event.year);

    if view.params.output_series {
        let path = dir.join(series_file_name(event.step));
        write_snapshot(&path, &snapshot)?;
        written.push(path);
    }
    if !event.is_last {
        return Ok(());
    }

    let path = dir.join(FINAL_SNAPSHOT);
    write_snapshot(&path, &snapshot)?;
    written.push(path);

    let summary = RunSummary::collect(view.land, view.regions, view.stats, view.params, event.step);
    written.push(write_json(dir, SUMMARY_FILE, &summary.to_json()?)?);
    let colors = ColorTable::for_steps(view.total_steps);
    written.push(write_json(dir, COLORS_FILE, &colors.to_json()?)?);
    Ok(())
}

fn write_json(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError> {
    let path = dir.join(name);
    atomic_write(&path, bytes)?;
    Ok(path)
}
