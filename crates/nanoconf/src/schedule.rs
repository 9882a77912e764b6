//! Schedule - learning-rate preview table

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use nanoconf_core::{load_config, LrSchedule};

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    pub config: PathBuf,

    /// Sample every N iterations
    #[arg(long, default_value_t = 500)]
    pub every: u64,
}

pub fn schedule_table(args: &ScheduleArgs) -> Result<String> {
    let config = load_config(&args.config)?;
    let schedule = LrSchedule::from_config(&config);
    info!(
        "Schedule: LR={}, MinLR={}, Warmup={}, Decay={}",
        schedule.learning_rate, schedule.min_lr, schedule.warmup_iters, schedule.lr_decay_iters
    );

    let mut out = format!("{:>10}  {:>12}\n", "iter", "lr");
    for point in schedule.preview(args.every) {
        out.push_str(&format!("{:>10}  {:>12.6e}\n", point.iter, point.lr));
    }
    Ok(out)
}

pub fn run(args: ScheduleArgs) -> Result<()> {
    print!("{}", schedule_table(&args)?);
    Ok(())
}
