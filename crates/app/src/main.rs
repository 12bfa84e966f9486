//! `patchgrow`: run a patch-growth land development simulation headlessly
//! and write its snapshots and summary to an output directory.

mod cli;

use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;

use save::{SnapshotConfig, SnapshotPlugin};
use simulation::scenario::Scenario;
use simulation::{GrowthError, GrowthPlugin, RunStatus};

use cli::{CliArgs, Source};

fn main() -> ExitCode {
    // Usage errors exit with status 2, `--help` and `--version` with 0.
    let cli = CliArgs::parse();

    // -- Build a headless Bevy App: no window, renderer or UI ---------------
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(LogPlugin {
        level: cli.log_level,
        ..default()
    });
    app.add_plugins((GrowthPlugin, SnapshotPlugin));
    app.insert_resource(SnapshotConfig {
        dir: cli.output.clone(),
    });

    let num_steps = match load_scenario(&cli) {
        Ok(scenario) => {
            let num_steps = scenario.params.num_steps;
            match scenario.into_run() {
                Ok(run) => {
                    run.install(app.world_mut());
                    num_steps
                }
                Err(e) => return fail(&e),
            }
        }
        Err(e) => return fail(&e),
    };

    // One update per step; the bound only guards against a stuck status.
    for _ in 0..=num_steps {
        app.update();
        match app.world().resource::<RunStatus>() {
            RunStatus::Finished => return ExitCode::SUCCESS,
            RunStatus::Failed(msg) => {
                error!("Run failed: {msg}");
                return ExitCode::FAILURE;
            }
            RunStatus::Idle | RunStatus::Running => {}
        }
    }
    error!("Run did not finish after {num_steps} steps");
    ExitCode::FAILURE
}

fn load_scenario(cli: &CliArgs) -> Result<Scenario, GrowthError> {
    let mut scenario = match cli.source() {
        Source::Scenario(path) => {
            info!("Loading scenario {}", path.display());
            Scenario::from_path(&path)?
        }
        Source::Synthetic(mut cfg) => {
            if let Some(steps) = cli.steps {
                cfg.num_steps = steps;
            }
            if let Some(seed) = cli.seed {
                cfg.seed = seed;
            }
            info!("Generating a {}x{} synthetic landscape", cfg.cols, cfg.rows);
            cfg.generate()
        }
    };
    cli.apply_overrides(&mut scenario.params);
    Ok(scenario)
}

fn fail(e: &GrowthError) -> ExitCode {
    error!("Cannot start run: {e}");
    ExitCode::FAILURE
}
