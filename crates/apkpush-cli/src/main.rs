//! apkpush - push an APK and its native libraries to an Android device

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apkpush_cli::cmd;
use apkpush_cli::cmd::push::PushOptions;
use apkpush_cli::ops::Context;
use apkpush_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Commands::Completions { shell } = cli.command {
        cmd::completions::completions(shell);
        return Ok(());
    }

    let ctx = Context::load(&cli)?;

    match cli.command {
        Commands::Push {
            apk,
            target,
            backup,
            skip_so,
            restart,
            json,
        } => cmd::push::push(
            &ctx,
            &PushOptions {
                apk,
                target,
                backup,
                skip_so,
                restart,
                json,
            },
        ),
        Commands::Libs { apk, target, json } => {
            cmd::libs::libs(&ctx, &apk, target.as_deref(), json)
        }
        Commands::Info => cmd::info::info(&ctx),
        Commands::Completions { .. } => Ok(()),
    }
}
