use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ucs_monitor::cli::token::MintTokenArgs;
use ucs_monitor::core::log::init_logging;
use ucs_monitor::core::{Interval, Role};

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

impl From<Commands> for ucs_monitor::AppCommand {
    fn from(cmd: Commands) -> ucs_monitor::AppCommand {
        match cmd {
            Commands::Serve => ucs_monitor::AppCommand::Serve,
            Commands::Prices => ucs_monitor::AppCommand::Prices,
            Commands::Index { interval } => ucs_monitor::AppCommand::Index { interval },
            Commands::MintToken {
                uid,
                email,
                name,
                role,
                ttl_secs,
            } => ucs_monitor::AppCommand::MintToken(MintTokenArgs {
                uid,
                email,
                name,
                role,
                ttl_secs,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP API
    Serve,
    /// Display current commodity prices
    Prices,
    /// Compute the UCS index for an interval
    Index {
        /// One of 1d, 1w, 1m, 3m, 6m, 1y
        #[arg(short, long, default_value = "1d")]
        interval: Interval,
    },
    /// Sign a session token for local development
    MintToken {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        /// admin or user
        #[arg(long, default_value = "user")]
        role: Role,
        /// Token lifetime; defaults to auth.session_max_age_secs
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ucs_monitor::cli::setup::setup_at_path(path),
            None => ucs_monitor::cli::setup::setup(),
        },
        Some(cmd) => ucs_monitor::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
