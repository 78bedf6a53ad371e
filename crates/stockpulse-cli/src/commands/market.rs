use stockpulse_core::StockDataClient;

use crate::error::CliError;

use super::CommandResult;

pub async fn run_status(client: &StockDataClient) -> Result<CommandResult, CliError> {
    CommandResult::from_fetched(client.market_status().await?)
}

pub async fn run_movers(client: &StockDataClient) -> Result<CommandResult, CliError> {
    CommandResult::from_fetched(client.top_movers().await?)
}
