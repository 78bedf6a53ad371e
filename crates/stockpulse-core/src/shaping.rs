//! Turns a classified-successful response body into a typed payload.
//!
//! A body that passed the classifier can still lack the data the caller
//! asked for (an unknown symbol yields `{"Global Quote": {}}`). Such bodies
//! are rejected as `DataNotAvailable` so they are never cached. A body that
//! has the expected section but does not fit the model is `Unknown`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::{
    CompanyOverview, Earnings, GlobalQuote, MarketStatus, NewsFeed, SeriesBar, SeriesMeta,
    SymbolSearch, TimeSeries, TopMovers,
};
use crate::ClassifiedError;

const GLOBAL_QUOTE_FIELD: &str = "Global Quote";
const META_DATA_FIELD: &str = "Meta Data";
const TIME_SERIES_MARKER: &str = "Time Series";

pub fn quote(body: Value) -> Result<GlobalQuote, ClassifiedError> {
    let section = match body {
        Value::Object(mut object) => object.remove(GLOBAL_QUOTE_FIELD),
        _ => None,
    };

    match section {
        Some(Value::Object(fields)) if !fields.is_empty() => decode(Value::Object(fields), "quote"),
        _ => Err(ClassifiedError::data_not_available(
            "no quote data for the requested symbol",
        )),
    }
}

pub fn company_overview(body: Value) -> Result<CompanyOverview, ClassifiedError> {
    require_non_empty_object(&body, "no company overview for the requested symbol")?;
    decode(body, "company overview")
}

pub fn earnings(body: Value) -> Result<Earnings, ClassifiedError> {
    require_non_empty_object(&body, "no earnings for the requested symbol")?;
    decode(body, "earnings")
}

pub fn symbol_search(body: Value) -> Result<SymbolSearch, ClassifiedError> {
    require_field(&body, "bestMatches", "no search results")?;
    decode(body, "symbol search")
}

pub fn news(body: Value) -> Result<NewsFeed, ClassifiedError> {
    require_field(&body, "feed", "no news feed in response")?;
    decode(body, "news feed")
}

pub fn market_status(body: Value) -> Result<MarketStatus, ClassifiedError> {
    require_field(&body, "markets", "no market status in response")?;
    decode(body, "market status")
}

/// Accepts a body carrying at least one of the three mover lists.
pub fn top_movers(body: Value) -> Result<TopMovers, ClassifiedError> {
    let has_any_list = ["top_gainers", "top_losers", "most_actively_traded"]
        .iter()
        .any(|field| body.get(field).is_some());
    if !has_any_list {
        return Err(ClassifiedError::data_not_available(
            "no market movers in response",
        ));
    }
    decode(body, "top movers")
}

/// Locates the `Time Series (..)`, `Weekly Time Series` or `Monthly Time
/// Series` section and parses its bars, oldest first.
pub fn time_series(body: Value) -> Result<TimeSeries, ClassifiedError> {
    let Value::Object(mut object) = body else {
        return Err(no_series());
    };

    let series_key = object
        .keys()
        .find(|key| key.contains(TIME_SERIES_MARKER))
        .cloned()
        .ok_or_else(no_series)?;

    let Some(Value::Object(raw_bars)) = object.remove(&series_key) else {
        return Err(no_series());
    };

    let meta = match object.get(META_DATA_FIELD) {
        Some(Value::Object(fields)) => parse_meta(fields),
        _ => SeriesMeta::default(),
    };

    let mut bars = raw_bars
        .iter()
        .map(|(timestamp, fields)| parse_bar(timestamp, fields).map(|bar| (timestamp.clone(), bar)))
        .collect::<Result<Vec<_>, _>>()?;
    bars.sort_by(|left, right| left.0.cmp(&right.0));

    Ok(TimeSeries { meta, bars })
}

fn no_series() -> ClassifiedError {
    ClassifiedError::data_not_available("no time series data in response")
}

/// Upstream labels are numbered (`"2. Symbol"`); the number differs between
/// series functions, so fields are matched on the label alone.
fn label(key: &str) -> String {
    key.split_once(". ")
        .map_or(key, |(_, label)| label)
        .trim()
        .to_ascii_lowercase()
}

fn parse_meta(fields: &Map<String, Value>) -> SeriesMeta {
    let mut meta = SeriesMeta::default();
    for (key, value) in fields {
        let Some(text) = value.as_str() else {
            continue;
        };
        match label(key).as_str() {
            "information" => meta.information = text.to_owned(),
            "symbol" => meta.symbol = text.to_owned(),
            "last refreshed" => meta.last_refreshed = text.to_owned(),
            "interval" => meta.interval = Some(text.to_owned()),
            "time zone" => meta.time_zone = text.to_owned(),
            _ => {}
        }
    }
    meta
}

fn parse_bar(timestamp: &str, fields: &Value) -> Result<SeriesBar, ClassifiedError> {
    let Value::Object(fields) = fields else {
        return Err(ClassifiedError::unknown(format!(
            "bar at {timestamp} is not an object"
        )));
    };

    let mut open = None;
    let mut high = None;
    let mut low = None;
    let mut close = None;
    let mut volume = None;
    for (key, value) in fields {
        let text = value.as_str().unwrap_or_default().trim();
        match label(key).as_str() {
            "open" => open = text.parse::<f64>().ok(),
            "high" => high = text.parse::<f64>().ok(),
            "low" => low = text.parse::<f64>().ok(),
            "close" => close = text.parse::<f64>().ok(),
            "volume" => volume = text.parse::<u64>().ok(),
            _ => {}
        }
    }

    match (open, high, low, close, volume) {
        (Some(open), Some(high), Some(low), Some(close), Some(volume)) => Ok(SeriesBar {
            open,
            high,
            low,
            close,
            volume,
        }),
        _ => Err(ClassifiedError::unknown(format!(
            "bar at {timestamp} is missing a numeric field"
        ))),
    }
}

fn require_non_empty_object(body: &Value, message: &str) -> Result<(), ClassifiedError> {
    match body {
        Value::Object(object) if !object.is_empty() => Ok(()),
        _ => Err(ClassifiedError::data_not_available(message)),
    }
}

fn require_field(body: &Value, field: &str, message: &str) -> Result<(), ClassifiedError> {
    if body.get(field).is_some() {
        Ok(())
    } else {
        Err(ClassifiedError::data_not_available(message))
    }
}

fn decode<T: DeserializeOwned>(body: Value, what: &str) -> Result<T, ClassifiedError> {
    serde_json::from_value(body).map_err(|error| {
        ClassifiedError::unknown(format!("unexpected {what} payload: {error}")).with_cause(error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn empty_global_quote_is_data_not_available() {
        let error = quote(json!({"Global Quote": {}})).expect_err("empty quote");
        assert_eq!(error.kind(), ErrorKind::DataNotAvailable);

        let error = quote(json!({})).expect_err("missing quote");
        assert_eq!(error.kind(), ErrorKind::DataNotAvailable);
    }

    #[test]
    fn quote_section_is_unwrapped() {
        let value = quote(json!({"Global Quote": {"01. symbol": "XYZ", "05. price": "100.00"}}))
            .expect("quote");
        assert_eq!(value.symbol, "XYZ");
        assert_eq!(value.price, "100.00");
    }

    #[test]
    fn quote_without_price_is_unknown() {
        let error = quote(json!({"Global Quote": {"01. symbol": "XYZ"}})).expect_err("no price");
        assert_eq!(error.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn empty_overview_and_earnings_are_data_not_available() {
        assert_eq!(
            company_overview(json!({})).expect_err("empty").kind(),
            ErrorKind::DataNotAvailable
        );
        assert_eq!(
            earnings(json!({})).expect_err("empty").kind(),
            ErrorKind::DataNotAvailable
        );
    }

    #[test]
    fn daily_series_is_sorted_oldest_first() {
        let series = time_series(json!({
            "Meta Data": {
                "1. Information": "Daily Prices (open, high, low, close) and Volumes",
                "2. Symbol": "IBM",
                "3. Last Refreshed": "2024-03-05",
                "4. Output Size": "Compact",
                "5. Time Zone": "US/Eastern"
            },
            "Time Series (Daily)": {
                "2024-03-05": {"1. open": "2", "2. high": "3", "3. low": "1", "4. close": "2.5", "5. volume": "200"},
                "2024-03-04": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "100"}
            }
        }))
        .expect("series");

        assert_eq!(series.meta.symbol, "IBM");
        assert_eq!(series.meta.time_zone, "US/Eastern");
        assert_eq!(series.meta.interval, None);
        assert_eq!(series.bars[0].0, "2024-03-04");
        assert_eq!(series.bars[1].1.volume, 200);
    }

    #[test]
    fn intraday_meta_carries_the_interval() {
        let series = time_series(json!({
            "Meta Data": {"2. Symbol": "IBM", "4. Interval": "5min", "6. Time Zone": "US/Eastern"},
            "Time Series (5min)": {}
        }))
        .expect("series");

        assert_eq!(series.meta.interval.as_deref(), Some("5min"));
        assert!(series.is_empty());
    }

    #[test]
    fn weekly_and_monthly_sections_are_found() {
        for key in ["Weekly Time Series", "Monthly Time Series"] {
            let series = time_series(json!({
                key: {"2024-01-31": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}}
            }))
            .expect("series");
            assert_eq!(series.len(), 1, "{key}");
        }
    }

    #[test]
    fn missing_series_is_data_not_available_and_bad_bar_is_unknown() {
        assert_eq!(
            time_series(json!({"Meta Data": {}})).expect_err("missing").kind(),
            ErrorKind::DataNotAvailable
        );

        let error = time_series(json!({
            "Time Series (Daily)": {"2024-01-02": {"1. open": "n/a"}}
        }))
        .expect_err("bad bar");
        assert_eq!(error.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn list_payloads_require_their_section() {
        assert_eq!(
            symbol_search(json!({})).expect_err("no matches").kind(),
            ErrorKind::DataNotAvailable
        );
        assert_eq!(
            news(json!({"items": "0"})).expect_err("no feed").kind(),
            ErrorKind::DataNotAvailable
        );
        assert_eq!(
            market_status(json!({"endpoint": "x"})).expect_err("no markets").kind(),
            ErrorKind::DataNotAvailable
        );
        assert_eq!(
            top_movers(json!({"metadata": "x"})).expect_err("no movers").kind(),
            ErrorKind::DataNotAvailable
        );
    }

    #[test]
    fn one_mover_list_is_enough() {
        let movers = top_movers(json!({"top_gainers": [{"ticker": "ABC", "change_percentage": "12.5%"}]}))
            .expect("movers");

        assert_eq!(movers.top_gainers[0].change_percentage_value(), Some(12.5));
        assert!(movers.top_losers.is_empty());
    }

    #[test]
    fn empty_search_matches_are_a_valid_answer() {
        let search = symbol_search(json!({"bestMatches": []})).expect("search");
        assert!(search.best_matches.is_empty());
    }
}
