//! Resolve - configurator-style merging of files and overrides

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use tracing::warn;

use nanoconf_core::{lint_config, resolve_args, validate_config, Resolved};

use crate::format::OutputFormat;

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Py)]
    pub format: OutputFormat,

    /// Print every option, not only those changed from the defaults
    #[arg(long, action)]
    pub all: bool,

    /// Skip validation of the resolved record
    #[arg(long, action)]
    pub no_validate: bool,

    /// Config files and --key=value overrides, applied left to right
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl ResolveArgs {
    /// Moves `--format`, `--all` and `--no-validate` out of the trailing
    /// arguments. Clap stops matching flags at the first file, so they end up
    /// there when written after it. None of them collide with an option name.
    pub fn with_own_flags(mut self) -> Result<Self> {
        let mut rest = Vec::with_capacity(self.args.len());
        let mut args = std::mem::take(&mut self.args).into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--all" => self.all = true,
                "--no-validate" => self.no_validate = true,
                "--format" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--format needs a value (py or json)"))?;
                    self.format = parse_format(&value)?;
                }
                _ => match arg.strip_prefix("--format=") {
                    Some(value) => self.format = parse_format(value)?,
                    None => rest.push(arg),
                },
            }
        }

        self.args = rest;
        Ok(self)
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(value, true).map_err(|e| anyhow!("--format: {e}"))
}

pub fn resolve(args: &ResolveArgs) -> Result<Resolved> {
    let resolved = resolve_args(&args.args)?;
    if !args.no_validate {
        validate_config(&resolved.config)?;
    }
    for lint in lint_config(&resolved.config) {
        warn!("{}", lint);
    }
    Ok(resolved)
}

pub fn render(args: &ResolveArgs) -> Result<String> {
    let resolved = resolve(args)?;
    args.format.render(&resolved.config, !args.all)
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let args = args.with_own_flags()?;
    print!("{}", render(&args)?);
    Ok(())
}
