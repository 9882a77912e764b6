//! Check - parse, validate and lint config files in parallel

use anyhow::{bail, Result};
use clap::Args;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{error, info, warn};

use nanoconf_core::{lint_config, load_config, validate_config, Lint};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Config files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Treat lints as failures
    #[arg(long, action)]
    pub strict: bool,
}

#[derive(Debug)]
pub enum Outcome {
    Passed { lints: Vec<Lint> },
    Failed { reason: String },
}

#[derive(Debug)]
pub struct CheckReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl CheckReport {
    pub fn passed(&self, strict: bool) -> bool {
        match &self.outcome {
            Outcome::Passed { lints } => !strict || lints.is_empty(),
            Outcome::Failed { .. } => false,
        }
    }
}

pub fn check_file(path: PathBuf) -> CheckReport {
    let result = load_config(&path).and_then(|config| {
        validate_config(&config)?;
        Ok(lint_config(&config))
    });
    let outcome = match result {
        Ok(lints) => Outcome::Passed { lints },
        Err(e) => Outcome::Failed {
            reason: format!("{e:#}"),
        },
    };
    CheckReport { path, outcome }
}

/// Checks every file, preserving input order in the result.
pub fn check_files(files: Vec<PathBuf>) -> Vec<CheckReport> {
    files.into_par_iter().map(check_file).collect()
}

pub fn run(args: CheckArgs) -> Result<()> {
    let total = args.files.len();
    let reports = check_files(args.files);

    let mut failed = 0;
    for report in &reports {
        let shown = report.path.display();
        match &report.outcome {
            Outcome::Passed { lints } => {
                for lint in lints {
                    warn!("{}: {}", shown, lint);
                }
                if report.passed(args.strict) {
                    println!("ok    {shown}");
                } else {
                    println!("lint  {shown}");
                }
            }
            Outcome::Failed { reason } => {
                error!("{}: {}", shown, reason);
                println!("FAIL  {shown}: {reason}");
            }
        }
        if !report.passed(args.strict) {
            failed += 1;
        }
    }

    info!("Checked {} config files, {} failed", total, failed);
    if failed > 0 {
        bail!("{failed} of {total} config files failed");
    }
    Ok(())
}
