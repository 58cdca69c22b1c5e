pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{ConversionService, ConversionSettings};
use crate::providers::ExchangeRateApiProvider;
use crate::store::ExchangeRateCache;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: f64,
        from: String,
        to: String,
        date: Option<String>,
    },
    Rate {
        from: String,
        to: Vec<String>,
        date: Option<String>,
    },
    Refresh,
    Status,
    Watch,
}

/// The wired-up service: one provider shared by the cache and the service.
pub struct App {
    pub cache: Arc<ExchangeRateCache>,
    pub service: ConversionService,
}

impl App {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = Arc::new(ExchangeRateApiProvider::new(&config.provider)?);
        let currencies = config.supported_currencies();

        let cache = Arc::new(ExchangeRateCache::new(
            provider.clone(),
            currencies.clone(),
            config.refresh_interval(),
        ));
        let service = ConversionService::new(
            cache.clone(),
            provider,
            ConversionSettings {
                currencies,
                max_historical_days: config.max_historical_days,
            },
        );

        Ok(App { cache, service })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        "Loaded config: {} currencies, refresh every {}s",
        config.currencies.len(),
        config.refresh_interval_secs
    );

    let app = App::from_config(&config)?;

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            date,
        } => cli::convert::run(&app.service, amount, &from, &to, date.as_deref()).await,
        AppCommand::Rate { from, to, date } => {
            cli::rate::run(&app.service, &from, &to, date.as_deref()).await
        }
        AppCommand::Refresh => cli::refresh::run(&app.cache).await,
        AppCommand::Status => cli::status::run(&app.service, &app.cache),
        AppCommand::Watch => cli::watch::run(&app.cache).await,
    }
}
