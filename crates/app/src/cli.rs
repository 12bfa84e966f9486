//! Command-line flags for the `patchgrow` binary.

use std::path::PathBuf;

use bevy::log::Level;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{ArgGroup, Parser};

use simulation::growth_params::{GrowthParams, Neighborhood, PressureDecay, SeedSearch};
use simulation::synthetic::SyntheticConfig;

/// Where the landscape comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Scenario(PathBuf),
    Synthetic(SyntheticConfig),
}

/// Run a patch-growth land development simulation headlessly.
#[derive(Debug, Parser)]
#[command(name = "patchgrow", version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["scenario", "synthetic"])))]
pub struct CliArgs {
    /// Scenario file (JSON) with layers, tables and parameters.
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,
    /// Generate a synthetic landscape of the given size instead.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub synthetic: Option<SyntheticConfig>,
    /// Output directory for snapshots and the run summary.
    #[arg(long, value_name = "DIR", default_value = "output")]
    pub output: PathBuf,
    /// Log level: error, warn, info, debug or trace.
    #[arg(long, value_name = "LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,
    /// Number of steps to simulate.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub steps: Option<u32>,
    /// Random seed.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
    /// Write a snapshot after every step, not just the last one.
    #[arg(long)]
    pub series: bool,
    /// How seeds are drawn from each region's undeveloped cells.
    #[arg(long, value_name = "MODE", value_parser = seed_search_parser())]
    pub seed_search: Option<SeedSearch>,
    /// Development pressure decay.
    #[arg(long = "pressure", value_name = "DECAY", value_parser = pressure_decay_parser())]
    pub pressure: Option<PressureDecay>,
    /// Patch growth neighborhood, 4 or 8.
    #[arg(long, value_name = "4|8", value_parser = parse_neighborhood)]
    pub neighborhood: Option<Neighborhood>,
    /// Mean of the compactness exponent.
    #[arg(long, value_name = "X")]
    pub compactness_mean: Option<f64>,
    /// Width of the compactness interval.
    #[arg(long, value_name = "X")]
    pub compactness_range: Option<f64>,
    /// Let patches overshoot the step's demand on all but the last step.
    #[arg(long)]
    pub overgrow: bool,
}

fn parse_size(size: &str) -> Result<SyntheticConfig, String> {
    SyntheticConfig::with_size(size).ok_or_else(|| format!("expected <W>x<H>, got '{size}'"))
}

fn parse_neighborhood(count: &str) -> Result<Neighborhood, String> {
    count
        .parse()
        .ok()
        .and_then(Neighborhood::from_count)
        .ok_or_else(|| format!("must be 4 or 8, got '{count}'"))
}

fn seed_search_parser() -> impl TypedValueParser<Value = SeedSearch> {
    PossibleValuesParser::new(["random", "probability"]).map(|mode| match mode.as_str() {
        "random" => SeedSearch::Random,
        _ => SeedSearch::Probability,
    })
}

fn pressure_decay_parser() -> impl TypedValueParser<Value = PressureDecay> {
    PossibleValuesParser::new(["occurrence", "gravity", "kernel"]).map(|decay| {
        match decay.as_str() {
            "occurrence" => PressureDecay::Occurrence,
            "kernel" => PressureDecay::Kernel,
            _ => PressureDecay::Gravity,
        }
    })
}

impl CliArgs {
    pub fn source(&self) -> Source {
        match (&self.scenario, &self.synthetic) {
            (Some(path), _) => Source::Scenario(path.clone()),
            (None, Some(cfg)) => Source::Synthetic(cfg.clone()),
            (None, None) => Source::Synthetic(SyntheticConfig::default()),
        }
    }

    /// Apply flag overrides on top of the scenario's parameters.
    pub fn apply_overrides(&self, params: &mut GrowthParams) {
        if let Some(steps) = self.steps {
            params.num_steps = steps;
        }
        if let Some(seed) = self.seed {
            params.random_seed = seed;
        }
        if self.series {
            params.output_series = true;
        }
        if self.overgrow {
            params.overgrow = true;
        }
        if let Some(mode) = self.seed_search {
            params.seed_search = mode;
        }
        if let Some(decay) = self.pressure {
            params.pressure.decay = decay;
        }
        if let Some(nb) = self.neighborhood {
            params.neighborhood = nb;
        }
        if let Some(mean) = self.compactness_mean {
            params.compactness_mean = mean;
        }
        if let Some(range) = self.compactness_range {
            params.compactness_range = range;
        }
    }
}
