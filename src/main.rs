use anyhow::Context;
use clap::Parser;
use shardscope::cli::{Cli, Command};
use shardscope::error::exit_code;
use shardscope::tui::DashboardConfig;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(err) = e.downcast_ref::<shardscope::Error>() {
                ExitCode::from(err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Validate CLI arguments
    cli.validate()
        .map_err(shardscope::Error::InvalidArgument)
        .context("Invalid arguments")?;

    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze => {
            shardscope::commands::analyze::run(&cli.queue_db)?;
        }
        Command::Monitor {
            iterations,
            per_page,
            refresh,
        } => {
            let config = DashboardConfig {
                per_page: usize::try_from(per_page).unwrap_or(usize::MAX),
                refresh_interval: refresh,
                iterations,
            };
            shardscope::commands::monitor::run(&cli.queue_db, config)?;
        }
        Command::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "shardscope", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
