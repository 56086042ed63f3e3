mod cmd;
mod config_path;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "waker",
    about = "Wake the usage windows of Claude accounts, one account at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./config.yaml, then config.yaml next to the binary)
    #[arg(long, global = true, env = "WAKER_CONFIG")]
    config: Option<PathBuf>,

    /// Also append log lines to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a wake request to every configured account
    Run {
        /// Only wake this account (repeatable)
        #[arg(long = "account", value_name = "NAME")]
        accounts: Vec<String>,

        /// Count an unanswered wake request as a failure
        #[arg(long)]
        strict_timeout: bool,

        /// Exit with status 1 if any account failed
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Validate the config and list accounts without waking anything
    Check,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_file.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let config = config_path::resolve_config_path(cli.config.as_deref());

    let result = match cli.command {
        Commands::Run {
            accounts,
            strict_timeout,
            fail_on_error,
        } => cmd::run::run(
            &config,
            cmd::run::RunArgs {
                accounts,
                strict_timeout,
                fail_on_error,
            },
            cli.json,
        ),
        Commands::Check => cmd::check::run(&config, cli.json).map(|()| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
