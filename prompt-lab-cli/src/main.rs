//! `prompt-lab` command-line entry point

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::context::Context;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,prompt_lab=debug"
    } else {
        "warn,prompt_lab=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so csv/json on stdout stay machine-readable.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn dispatch(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::ListTasks => commands::tasks::list(ctx),
        Commands::TaskInfo { task } => commands::tasks::info(ctx, &task),
        Commands::Run { task, strategies } => commands::run::run(ctx, &task, strategies).await,
        Commands::RunAll => commands::run::run_all(ctx).await,
        Commands::Compare { task } => commands::compare::execute(ctx, &task).await,
        Commands::Benchmark { task, iterations } => {
            commands::benchmark::execute(ctx, &task, iterations).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match Context::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    tracing::debug!(config = %cli.config.display(), format = %ctx.output_format, "Starting");

    if let Err(e) = dispatch(&ctx, cli.command).await {
        ctx.output.error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}
