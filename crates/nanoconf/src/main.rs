use anyhow::Result;
use clap::Parser;
use nanoconf::cli::{Cli, Commands};
use nanoconf::{check, diff, estimate, preset, resolve, schedule};
use tracing_appender::non_blocking::WorkerGuard;

/// Logs go to stderr and to a daily file under `logs/`; stdout is reserved
/// for command output so it can be piped into a config file.
fn init_logging() -> WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let (log_file, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "nanoconf.log"));

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .init();

    guard
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let msg = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("unknown panic");
        let at = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(target: "panic", "nanoconf crashed at {}: {}", at, msg);
        eprintln!("nanoconf crashed at {at}: {msg}");
    }));
}

fn main() -> Result<()> {
    let _guard = init_logging();
    install_panic_hook();

    match Cli::parse().command {
        Commands::Check(args) => check::run(args),
        Commands::Resolve(args) => resolve::run(args),
        Commands::Diff(args) => diff::run(args),
        Commands::Schedule(args) => schedule::run(args),
        Commands::Estimate(args) => estimate::run(args),
        Commands::Preset(args) => preset::run(args),
    }
}
