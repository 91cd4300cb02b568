mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use macgate_core::{Controller, LoopbackRadio};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config and normalize never touch the store
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Normalize { mac } => commands::normalize::handle(&mac, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "macgate", &mut std::io::stdout());
            Ok(())
        }

        // The simulator owns its engine and radio
        Command::Simulate(args) => commands::simulate::handle(args, &cli.global).await,

        // Everything else runs one request against the stored lists
        cmd => {
            let cfg = config::load(&cli.global)?;
            let gate_config = config::gate_config(&cfg)?;
            let store = config::open_store(&cli.global, &cfg)?;
            let controller = Controller::start(gate_config, store, Arc::new(LoopbackRadio::new()))?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.shutdown().await;
            result
        }
    }
}
