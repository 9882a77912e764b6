//! Preset - the configs shipped with the repository

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

use nanoconf_core::{write_config, Preset};

use crate::format::OutputFormat;

#[derive(Args, Debug, Clone)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PresetCommand {
    /// List shipped presets
    List,
    /// Print or write a preset
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    pub name: String,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Py)]
    pub format: OutputFormat,
}

pub fn list() -> String {
    Preset::all()
        .iter()
        .map(|p| format!("{:<28} {}\n", p.name(), p.file_name()))
        .collect()
}

/// The preset as text: the shipped file verbatim for `py`, the resolved
/// record for `json`.
pub fn render(args: &ShowArgs) -> Result<String> {
    let preset = Preset::from_name(&args.name)
        .ok_or_else(|| anyhow!("Unknown preset: {} (see `preset list`)", args.name))?;
    match args.format {
        OutputFormat::Py => Ok(preset.source().to_string()),
        OutputFormat::Json => OutputFormat::Json.render(&preset.config()?, false),
    }
}

pub fn run(args: PresetArgs) -> Result<()> {
    match args.command {
        PresetCommand::List => print!("{}", list()),
        PresetCommand::Show(show) => {
            let text = render(&show)?;
            match &show.out {
                Some(path) => {
                    let contents = match show.format {
                        OutputFormat::Py => format!(
                            "# {} written by nanoconf {}\n{}",
                            show.name,
                            chrono::Local::now().to_rfc3339(),
                            text
                        ),
                        OutputFormat::Json => text,
                    };
                    write_config(path, &contents)?;
                    info!("✅ Wrote {} to {}", show.name, path.display());
                }
                None => print!("{text}"),
            }
        }
    }
    Ok(())
}
