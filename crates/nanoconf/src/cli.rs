use crate::check::CheckArgs;
use crate::diff::DiffArgs;
use crate::estimate::EstimateArgs;
use crate::preset::PresetArgs;
use crate::resolve::ResolveArgs;
use crate::schedule::ScheduleArgs;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Training configuration toolchain", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse, validate and lint config files
    Check(CheckArgs),

    /// Resolve config files and --key=value overrides into one record
    Resolve(ResolveArgs),

    /// Show options that differ between two config files
    Diff(DiffArgs),

    /// Preview the learning-rate schedule
    Schedule(ScheduleArgs),

    /// Estimate parameter count, tokens per iteration and memory
    Estimate(EstimateArgs),

    /// List or materialize the shipped configs
    Preset(PresetArgs),
}
