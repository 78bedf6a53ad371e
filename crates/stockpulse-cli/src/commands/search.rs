use stockpulse_core::{StockDataClient, ValidationError};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SearchArgs, client: &StockDataClient) -> Result<CommandResult, CliError> {
    if args.keywords.trim().is_empty() {
        return Err(ValidationError::EmptyKeywords.into());
    }

    CommandResult::from_fetched(client.search_symbol(&args.keywords).await?)
}
