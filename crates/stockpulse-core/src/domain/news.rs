use crate::domain::Symbol;
use crate::ValidationError;

const MAX_NEWS_LIMIT: u32 = 1_000;
const DEFAULT_NEWS_LIMIT: u32 = 50;

/// Filter for the news & sentiment feed.
///
/// Tickers and topics are deduplicated and sorted so the same filter always
/// maps onto the same cache entry regardless of argument order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    tickers: Vec<Symbol>,
    topics: Vec<String>,
    limit: u32,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            topics: Vec::new(),
            limit: DEFAULT_NEWS_LIMIT,
        }
    }
}

impl NewsQuery {
    pub fn new(tickers: Vec<Symbol>, topics: Vec<String>, limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 || limit > MAX_NEWS_LIMIT {
            return Err(ValidationError::NewsLimitOutOfRange {
                value: limit,
                max: MAX_NEWS_LIMIT,
            });
        }

        let mut topics = topics
            .iter()
            .map(|topic| topic.trim().to_ascii_lowercase())
            .collect::<Vec<_>>();
        if topics.iter().any(String::is_empty) {
            return Err(ValidationError::EmptyTopic);
        }
        topics.sort();
        topics.dedup();

        let mut tickers = tickers;
        tickers.sort();
        tickers.dedup();

        Ok(Self {
            tickers,
            topics,
            limit,
        })
    }

    pub fn tickers(&self) -> &[Symbol] {
        &self.tickers
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Comma-joined tickers, or `None` for the general feed.
    pub fn tickers_param(&self) -> Option<String> {
        if self.tickers.is_empty() {
            return None;
        }
        Some(
            self.tickers
                .iter()
                .map(Symbol::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    pub fn topics_param(&self) -> Option<String> {
        if self.topics.is_empty() {
            return None;
        }
        Some(self.topics.join(","))
    }

    pub fn cache_key(&self) -> String {
        format!(
            "news_{}_{}_{}",
            self.tickers_param().unwrap_or_else(|| String::from("general")),
            self.topics_param().unwrap_or_else(|| String::from("general")),
            self.limit
        )
    }
}
