//! Output format shared by the subcommands that print a record.

use anyhow::Result;
use clap::ValueEnum;
use nanoconf_core::{render_json, render_python, TrainConfig};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `key = value` assignment file
    #[default]
    Py,
    /// Pretty-printed JSON object
    Json,
}

impl OutputFormat {
    pub fn render(&self, config: &TrainConfig, only_changed: bool) -> Result<String> {
        match self {
            OutputFormat::Py => Ok(render_python(config, only_changed)),
            OutputFormat::Json => Ok(render_json(config)? + "\n"),
        }
    }
}
