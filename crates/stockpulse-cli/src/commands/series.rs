use stockpulse_core::{Interval, SeriesGranularity, StockDataClient, Symbol};

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SeriesArgs, client: &StockDataClient) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let interval = args.interval.parse::<Interval>()?;
    let granularity = SeriesGranularity::parse(&args.granularity, interval)?;

    CommandResult::from_fetched(client.time_series(&symbol, granularity).await?)
}
