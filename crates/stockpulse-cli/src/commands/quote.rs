use stockpulse_core::{StockDataClient, Symbol};

use crate::cli::SymbolArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SymbolArgs, client: &StockDataClient) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let fetched = client.global_quote(&symbol).await?;
    CommandResult::from_fetched(fetched)
}
