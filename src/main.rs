mod commands;
mod sysexits;

use crate::commands::{Cli, Commands};
use clap::Parser;
use std::process;

/// Entry point for the rsync-daemon CLI application.
/// Parses command-line arguments and dispatches to the appropriate command handler.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let Some(commands) = cli.commands else {
        eprintln!(
            "rsync-daemon requires a command to execute. See 'rsync-daemon --help' for usage."
        );
        process::exit(sysexits::EX_USAGE);
    };

    let config = cli.config.as_deref();
    let result = match commands {
        Commands::Check => commands::check(config, cli.ignore_validation),
        Commands::Run { parallel, rsync } => {
            commands::run(config, cli.ignore_validation, parallel, &rsync)
        }
        Commands::Volumes => commands::volumes(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(sysexits::exit_code(&e));
    }
}
