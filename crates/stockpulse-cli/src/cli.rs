//! CLI argument definitions for StockPulse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Latest quote for a symbol |
//! | `overview` | Company fundamentals |
//! | `series` | Intraday, daily, weekly or monthly prices |
//! | `news` | News and sentiment feed |
//! | `search` | Symbol search |
//! | `market-status` | Open/closed state of global markets |
//! | `earnings` | Annual and quarterly earnings |
//! | `movers` | Top gainers, losers and most active tickers |
//! | `cache` | List, inspect or clear cached responses |
//!
//! # Environment
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STOCKPULSE_API_KEY` | `demo` | API key (`ALPHA_VANTAGE_API_KEY` also accepted) |
//! | `STOCKPULSE_BASE_URL` | `https://www.alphavantage.co/query` | Upstream endpoint |
//! | `STOCKPULSE_CACHE_TTL_MS` | `300000` | Cache freshness window |
//! | `STOCKPULSE_REQUESTS_PER_MINUTE` | unset | Client-side request budget |
//! | `STOCKPULSE_HOME` | `~/.stockpulse` | Location of the cache database |
//! | `STOCKPULSE_LOG` | `warn` | Log filter |
//!
//! # Examples
//!
//! ```bash
//! stockpulse quote AAPL --pretty
//! stockpulse series MSFT --granularity intraday --interval 15min
//! stockpulse news --ticker AAPL --topic technology --limit 10
//! stockpulse cache list
//! stockpulse cache show quote_AAPL
//! ```

use clap::{Args, Parser, Subcommand};

/// StockPulse - resilient stock market data from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "stockpulse",
    author,
    version,
    about = "Stock market data with local caching and stale fallback"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for a symbol.
    ///
    /// # Examples
    ///
    ///   stockpulse quote AAPL
    Quote(SymbolArgs),

    /// Fetch company fundamentals.
    Overview(SymbolArgs),

    /// Fetch a price series.
    ///
    /// # Examples
    ///
    ///   stockpulse series IBM
    ///   stockpulse series IBM --granularity intraday --interval 60min
    Series(SeriesArgs),

    /// Fetch the news and sentiment feed.
    ///
    /// Without tickers or topics the general market feed is returned.
    News(NewsArgs),

    /// Search symbols by name or ticker fragment.
    Search(SearchArgs),

    /// Show whether the major markets are open.
    MarketStatus,

    /// Fetch reported and estimated earnings.
    Earnings(SymbolArgs),

    /// Fetch today's top gainers, losers and most active tickers.
    Movers,

    /// Cache management commands.
    Cache(CacheArgs),
}

/// A single market symbol.
#[derive(Debug, Args)]
pub struct SymbolArgs {
    /// Market symbol (e.g., AAPL, BRK.B).
    pub symbol: String,
}

/// Arguments for the `series` command.
#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Market symbol to fetch prices for.
    pub symbol: String,

    /// Series granularity: intraday, daily, weekly or monthly.
    #[arg(long, default_value = "daily")]
    pub granularity: String,

    /// Bar interval for intraday series: 1min, 5min, 15min, 30min, 60min.
    #[arg(long, default_value = "5min")]
    pub interval: String,
}

/// Arguments for the `news` command.
#[derive(Debug, Args)]
pub struct NewsArgs {
    /// Restrict the feed to a ticker. Repeatable.
    #[arg(long = "ticker")]
    pub tickers: Vec<String>,

    /// Restrict the feed to a topic (e.g., technology, earnings). Repeatable.
    #[arg(long = "topic")]
    pub topics: Vec<String>,

    /// Maximum number of articles (1-1000).
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-form search keywords (company name or ticker fragment).
    pub keywords: String,
}

/// Arguments for the `cache` command group.
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache management subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached keys.
    List,

    /// Show a cached entry with its age and freshness.
    ///
    /// Keys look like `quote_AAPL`, `daily_IBM` or `market_status`.
    Show(CacheKeyArgs),

    /// Remove a cached entry.
    ClearKey(CacheKeyArgs),
}

#[derive(Debug, Args)]
pub struct CacheKeyArgs {
    /// Cache key without the storage namespace.
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_series_defaults() {
        let cli = Cli::try_parse_from(["stockpulse", "series", "IBM"]).expect("parse");

        match cli.command {
            Command::Series(args) => {
                assert_eq!(args.symbol, "IBM");
                assert_eq!(args.granularity, "daily");
                assert_eq!(args.interval, "5min");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_repeatable_news_filters() {
        let cli = Cli::try_parse_from([
            "stockpulse",
            "news",
            "--ticker",
            "AAPL",
            "--ticker",
            "MSFT",
            "--topic",
            "technology",
            "--pretty",
        ])
        .expect("parse");

        assert!(cli.pretty);
        match cli.command {
            Command::News(args) => {
                assert_eq!(args.tickers, vec!["AAPL", "MSFT"]);
                assert_eq!(args.topics, vec!["technology"]);
                assert_eq!(args.limit, 50);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_kebab_case_subcommands() {
        let cli = Cli::try_parse_from(["stockpulse", "cache", "clear-key", "quote_AAPL"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Cache(CacheArgs {
                command: CacheCommand::ClearKey(_)
            })
        ));

        let cli = Cli::try_parse_from(["stockpulse", "cache", "list"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Cache(CacheArgs {
                command: CacheCommand::List
            })
        ));

        let cli = Cli::try_parse_from(["stockpulse", "market-status"]).expect("parse");
        assert!(matches!(cli.command, Command::MarketStatus));
    }
}
