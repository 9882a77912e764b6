//! Diff - option-level comparison of two config files

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use nanoconf_core::{load_config, FieldDiff};

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
}

pub fn diff_files(args: &DiffArgs) -> Result<Vec<FieldDiff>> {
    let left = load_config(&args.left)?;
    let right = load_config(&args.right)?;
    Ok(left.diff(&right))
}

pub fn format_diff(diffs: &[FieldDiff]) -> String {
    let width = diffs.iter().map(|d| d.key.len()).max().unwrap_or(0);
    diffs
        .iter()
        .map(|d| {
            format!(
                "{:width$}  {} -> {}\n",
                d.key,
                d.left.render_python(),
                d.right.render_python()
            )
        })
        .collect()
}

pub fn run(args: DiffArgs) -> Result<()> {
    let diffs = diff_files(&args)?;
    if diffs.is_empty() {
        println!("No differences.");
    } else {
        print!("{}", format_diff(&diffs));
    }
    Ok(())
}
