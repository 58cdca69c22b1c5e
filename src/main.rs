use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xrate::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                date,
            } => xrate::AppCommand::Convert {
                amount,
                from,
                to,
                date,
            },
            Commands::Rate { from, to, date } => xrate::AppCommand::Rate { from, to, date },
            Commands::Refresh => xrate::AppCommand::Refresh,
            Commands::Status => xrate::AppCommand::Status,
            Commands::Watch => xrate::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount in the source currency
        amount: f64,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
        /// Use the rate of a past day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show exchange rates from one currency to one or more others
    Rate {
        /// Source currency code
        from: String,
        /// Target currency codes
        #[arg(required = true, num_args = 1..)]
        to: Vec<String>,
        /// Show the rate of a past day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Refresh every supported pair once and show the cached rates
    Refresh,
    /// Show version, configuration and cache state
    Status,
    /// Keep rates refreshed in the background until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xrate::cli::setup::setup(),
        Some(cmd) => xrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
