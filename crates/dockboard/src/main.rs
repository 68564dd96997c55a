mod cli;
mod commands;
mod config;
mod dialogs;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dockboard_core::DashboardController;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

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
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { mut global, command } = cli;

    match command {
        // Config commands don't need a host connection
        Command::Config(args) => commands::config_cmd::handle(args, &global).await,

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "dockboard", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load(&global)?;
            global.apply_defaults(&cfg.defaults);
            let profile = config::active_profile_name(&global, &cfg);

            let mut host_config = config::build_host_config(&global, &cfg)?;
            // Only `watch` follows state changes; everything else reads once.
            host_config.live_states = matches!(cmd, Command::Watch(_));

            let controller = DashboardController::new(host_config);
            let spinner = commands::util::spinner("Connecting", global.quiet);
            let connected = controller.connect().await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            connected.map_err(|e| CliError::from(e).for_profile(&profile))?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &global).await;
            controller.disconnect().await;
            result.map_err(|e| e.for_profile(&profile))
        }
    }
}
