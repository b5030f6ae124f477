pub mod cli;
pub mod core;
pub mod http;
pub mod providers;
pub mod store;

use crate::cli::token::MintTokenArgs;
use crate::core::config::AppConfig;
use crate::core::{IndexAggregator, Interval};
use crate::providers::record_store::StorePriceSource;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Prices,
    Index { interval: Interval },
    MintToken(MintTokenArgs),
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("UCS monitor starting...");

    let config = load_config(config_path)?;
    debug!(
        bind = %config.server.bind,
        store = %config.store.base_url,
        flows = %config.ai.base_url,
        "Loaded config"
    );

    match command {
        AppCommand::Serve => cli::serve::serve(&config).await,
        AppCommand::Prices => {
            let source = StorePriceSource::from_config(&config.store);
            cli::prices::show_prices(&source).await
        }
        AppCommand::Index { interval } => {
            let source = StorePriceSource::from_config(&config.store);
            let aggregator = IndexAggregator::with_weights(&config.index.weights);
            cli::index::show_index(&source, &aggregator, interval).await
        }
        AppCommand::MintToken(args) => {
            let token = cli::token::mint_token(&config, &args)?;
            println!("{token}");
            Ok(())
        }
    }
}
