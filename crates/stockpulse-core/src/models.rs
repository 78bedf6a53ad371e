//! Typed payloads returned by the endpoint client.
//!
//! Field names follow the upstream JSON so a value can be deserialized
//! straight from a response body and written to the cache in the same shape.
//! Numeric fields the upstream sends as strings stay strings; the helper
//! accessors parse them on demand.

use serde::{Deserialize, Serialize};

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').parse::<f64>().ok()
}

/// Latest trade summary for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: String,
    #[serde(rename = "02. open", default)]
    pub open: String,
    #[serde(rename = "03. high", default)]
    pub high: String,
    #[serde(rename = "04. low", default)]
    pub low: String,
    #[serde(rename = "05. price")]
    pub price: String,
    #[serde(rename = "06. volume", default)]
    pub volume: String,
    #[serde(rename = "07. latest trading day", default)]
    pub latest_trading_day: String,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: String,
    #[serde(rename = "09. change", default)]
    pub change: String,
    #[serde(rename = "10. change percent", default)]
    pub change_percent: String,
}

impl GlobalQuote {
    pub fn price_value(&self) -> Option<f64> {
        parse_number(&self.price)
    }

    pub fn change_value(&self) -> Option<f64> {
        parse_number(&self.change)
    }

    /// `"1.2345%"` as `1.2345`.
    pub fn change_percent_value(&self) -> Option<f64> {
        parse_number(&self.change_percent)
    }
}

/// Company fundamentals. The upstream reports missing figures as `"None"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "AssetType")]
    pub asset_type: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Exchange")]
    pub exchange: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "MarketCapitalization")]
    pub market_capitalization: String,
    #[serde(rename = "PERatio")]
    pub pe_ratio: String,
    #[serde(rename = "EPS")]
    pub eps: String,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: String,
    #[serde(rename = "Beta")]
    pub beta: String,
    #[serde(rename = "52WeekHigh")]
    pub week_52_high: String,
    #[serde(rename = "52WeekLow")]
    pub week_52_low: String,
}

impl CompanyOverview {
    pub fn market_capitalization_value(&self) -> Option<f64> {
        parse_number(&self.market_capitalization)
    }

    pub fn pe_ratio_value(&self) -> Option<f64> {
        parse_number(&self.pe_ratio)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub information: String,
    pub symbol: String,
    pub last_refreshed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    pub time_zone: String,
}

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars keyed by the upstream timestamp, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub meta: SeriesMeta,
    pub bars: Vec<(String, SeriesBar)>,
}

impl TimeSeries {
    pub fn latest(&self) -> Option<&(String, SeriesBar)> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicRelevance {
    pub topic: String,
    #[serde(default)]
    pub relevance_score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSentiment {
    pub ticker: String,
    pub relevance_score: String,
    pub ticker_sentiment_score: String,
    pub ticker_sentiment_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub time_published: String,
    pub authors: Vec<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    pub source: String,
    pub category_within_source: String,
    pub source_domain: String,
    pub topics: Vec<TopicRelevance>,
    pub overall_sentiment_score: f64,
    pub overall_sentiment_label: String,
    pub ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    #[serde(default)]
    pub items: String,
    #[serde(default)]
    pub sentiment_score_definition: String,
    #[serde(default)]
    pub relevance_score_definition: String,
    pub feed: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name", default)]
    pub name: String,
    #[serde(rename = "3. type", default)]
    pub match_type: String,
    #[serde(rename = "4. region", default)]
    pub region: String,
    #[serde(rename = "5. marketOpen", default)]
    pub market_open: String,
    #[serde(rename = "6. marketClose", default)]
    pub market_close: String,
    #[serde(rename = "7. timezone", default)]
    pub timezone: String,
    #[serde(rename = "8. currency", default)]
    pub currency: String,
    #[serde(rename = "9. matchScore", default)]
    pub match_score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSearch {
    #[serde(rename = "bestMatches")]
    pub best_matches: Vec<SymbolMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSession {
    pub market_type: String,
    pub region: String,
    pub primary_exchanges: String,
    pub local_open: String,
    pub local_close: String,
    pub current_status: String,
    pub notes: String,
}

impl MarketSession {
    pub fn is_open(&self) -> bool {
        self.current_status.eq_ignore_ascii_case("open")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    #[serde(default)]
    pub endpoint: String,
    pub markets: Vec<MarketSession>,
}

impl MarketStatus {
    pub fn region(&self, region: &str) -> Option<&MarketSession> {
        self.markets
            .iter()
            .find(|session| session.region.eq_ignore_ascii_case(region))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnualEarnings {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "reportedEPS")]
    pub reported_eps: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarterlyEarnings {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "reportedDate")]
    pub reported_date: String,
    #[serde(rename = "reportedEPS")]
    pub reported_eps: String,
    #[serde(rename = "estimatedEPS")]
    pub estimated_eps: String,
    pub surprise: String,
    #[serde(rename = "surprisePercentage")]
    pub surprise_percentage: String,
    #[serde(rename = "reportTime")]
    pub report_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Earnings {
    pub symbol: String,
    #[serde(rename = "annualEarnings")]
    pub annual_earnings: Vec<AnnualEarnings>,
    #[serde(rename = "quarterlyEarnings")]
    pub quarterly_earnings: Vec<QuarterlyEarnings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMover {
    pub ticker: String,
    pub price: String,
    pub change_amount: String,
    pub change_percentage: String,
    pub volume: String,
}

impl MarketMover {
    pub fn change_percentage_value(&self) -> Option<f64> {
        parse_number(&self.change_percentage)
    }
}

/// Top gainers, top losers and most actively traded tickers of the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopMovers {
    pub metadata: String,
    pub last_updated: String,
    pub top_gainers: Vec<MarketMover>,
    pub top_losers: Vec<MarketMover>,
    pub most_actively_traded: Vec<MarketMover>,
}
