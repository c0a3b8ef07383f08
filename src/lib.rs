pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{LookbackPeriod, QueryParams};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    List(QueryParams),
    Sectors,
    Analysis {
        ticker: String,
        /// Falls back to the configured lookback.
        period: Option<LookbackPeriod>,
    },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => {
            let default_path = AppConfig::default_config_path()?;
            if default_path.exists() {
                AppConfig::load_from_path(&default_path)
            } else {
                debug!(
                    path = %default_path.display(),
                    "No config file found, using defaults"
                );
                Ok(AppConfig::default())
            }
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Oakie starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let provider = providers::from_source(&config.source.resolve())?;

    match command {
        AppCommand::List(params) => cli::list::run(provider.as_ref(), &params).await,
        AppCommand::Sectors => cli::sectors::run(provider.as_ref()).await,
        AppCommand::Analysis { ticker, period } => {
            let today = chrono::Local::now().date_naive();
            cli::analysis::run(
                provider.as_ref(),
                &ticker,
                period.unwrap_or(config.lookback),
                today,
            )
            .await
        }
    }
}
