use stockpulse_core::{NewsQuery, StockDataClient, Symbol};

use crate::cli::NewsArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &NewsArgs, client: &StockDataClient) -> Result<CommandResult, CliError> {
    let tickers = args
        .tickers
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let query = NewsQuery::new(tickers, args.topics.clone(), args.limit)?;

    CommandResult::from_fetched(client.news(&query).await?)
}
