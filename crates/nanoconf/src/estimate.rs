//! Estimate - model size and memory footprint

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use nanoconf_core::{load_config, SizeEstimate};

#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    pub config: PathBuf,

    /// Vocabulary size (defaults to the dataset's known vocabulary)
    #[arg(long)]
    pub vocab_size: Option<u64>,

    /// Print JSON instead of text
    #[arg(long, action)]
    pub json: bool,
}

pub fn estimate(args: &EstimateArgs) -> Result<SizeEstimate> {
    let config = load_config(&args.config)?;
    Ok(SizeEstimate::new(&config, args.vocab_size))
}

pub fn format_estimate(e: &SizeEstimate) -> String {
    format!(
        "vocab size       {}\n\
         parameters       {} ({:.2}M)\n\
         tokens per iter  {}\n\
         memory           {:.1} MB (model {:.1}, activations {:.1}, overhead {:.0})\n\
         tier             {}\n",
        e.vocab_size,
        e.params,
        e.params_millions(),
        e.tokens_per_iter,
        e.memory.total_mb,
        e.memory.model_mb,
        e.memory.activation_mb,
        e.memory.overhead_mb,
        e.memory.tier.label(),
    )
}

pub fn run(args: EstimateArgs) -> Result<()> {
    let e = estimate(&args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&e)?);
    } else {
        print!("{}", format_estimate(&e));
    }
    Ok(())
}
