mod cache;
mod earnings;
mod market;
mod news;
mod overview;
mod quote;
mod search;
mod series;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use stockpulse_core::{
    ClassifiedError, ClientConfig, DataOrigin, DuckDbStorage, Fetched, ReqwestHttpClient,
    StockDataClient,
};
use stockpulse_store::{KvStore, StoreConfig};
use tracing::{debug, warn};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    /// `None` for commands that do not fetch market data.
    pub origin: Option<&'static str>,
    pub stale_error: Option<ClassifiedError>,
}

impl CommandResult {
    pub fn plain(data: Value) -> Self {
        Self {
            data,
            origin: None,
            stale_error: None,
        }
    }

    pub fn from_fetched<T: Serialize>(fetched: Fetched<T>) -> Result<Self, CliError> {
        let data = serde_json::to_value(&fetched.value)?;
        let (origin, stale_error) = match fetched.origin {
            DataOrigin::Cache => ("cache", None),
            DataOrigin::Upstream => ("upstream", None),
            DataOrigin::Stale { error } => ("stale", Some(error)),
        };
        Ok(Self {
            data,
            origin: Some(origin),
            stale_error,
        })
    }

    pub fn stale_warning(&self) -> Option<String> {
        self.stale_error.as_ref().map(|error| {
            format!(
                "{} ({}); showing cached data that may be outdated",
                error.category(),
                error.message()
            )
        })
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let client = build_client()?;

    match &cli.command {
        Command::Quote(args) => quote::run(args, &client).await,
        Command::Overview(args) => overview::run(args, &client).await,
        Command::Series(args) => series::run(args, &client).await,
        Command::News(args) => news::run(args, &client).await,
        Command::Search(args) => search::run(args, &client).await,
        Command::MarketStatus => market::run_status(&client).await,
        Command::Earnings(args) => earnings::run(args, &client).await,
        Command::Movers => market::run_movers(&client).await,
        Command::Cache(args) => cache::run(args, &client).await,
    }
}

fn build_client() -> Result<StockDataClient, CliError> {
    let config = ClientConfig::from_env()?;
    if config.uses_demo_key() {
        warn!("no API key configured; using the demo key, which only serves sample symbols");
    }

    let store = KvStore::open(StoreConfig::default())?;
    debug!(path = %store.db_path().display(), "opened device storage");

    Ok(StockDataClient::new(
        config,
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(DuckDbStorage::new(store)),
    ))
}
