//! Endpoint client: cache, classifier and retry engine wired per endpoint.
//!
//! Every method follows the same flow:
//!
//! 1. a fresh cache entry under the endpoint's key is returned as is;
//! 2. otherwise the retry engine drives upstream attempts, each one
//!    classified and shaped into the typed payload;
//! 3. a successful payload overwrites the cache entry and is returned;
//! 4. when every attempt failed, any cached entry regardless of age is
//!    returned as [`DataOrigin::Stale`]; with nothing cached the last
//!    [`ClassifiedError`] is returned with its kind intact.
//!
//! An expired entry stays in storage until a successful fetch replaces it.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{Clock, PersistentCache, SystemClock};
use crate::classifier::classify;
use crate::config::ClientConfig;
use crate::domain::{NewsQuery, SeriesGranularity, Symbol};
use crate::http_client::{HttpClient, HttpRequest};
use crate::models::{
    CompanyOverview, Earnings, GlobalQuote, MarketStatus, NewsFeed, SymbolSearch, TimeSeries,
    TopMovers,
};
use crate::pacing::RequestPacer;
use crate::retry::RetryEngine;
use crate::storage::DeviceStorage;
use crate::{shaping, ClassifiedError, ValidationError};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const NEWS_TIMEOUT_MS: u64 = 15_000;
const LOOKUP_MAX_ATTEMPTS: u32 = 2;

/// Where a returned value came from.
#[derive(Debug, Clone)]
pub enum DataOrigin {
    /// Fresh cache entry; no upstream call was made.
    Cache,
    Upstream,
    /// Upstream failed; this is the last cached value, possibly outdated.
    Stale { error: ClassifiedError },
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: DataOrigin,
}

impl<T> Fetched<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self.origin, DataOrigin::Stale { .. })
    }

    /// The upstream failure a stale value stands in for.
    pub fn stale_error(&self) -> Option<&ClassifiedError> {
        match &self.origin {
            DataOrigin::Stale { error } => Some(error),
            _ => None,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// One upstream endpoint call.
struct EndpointCall {
    function: &'static str,
    cache_key: String,
    params: Vec<(&'static str, String)>,
    max_attempts: Option<u32>,
    timeout_ms: u64,
}

impl EndpointCall {
    fn new(function: &'static str, cache_key: String) -> Self {
        Self {
            function,
            cache_key,
            params: Vec::new(),
            max_attempts: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Resilient client for the stock data API.
#[derive(Clone)]
pub struct StockDataClient {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
    cache: PersistentCache,
    retry: RetryEngine,
    pacer: Option<RequestPacer>,
}

impl StockDataClient {
    pub fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn DeviceStorage>,
    ) -> Self {
        Self::with_clock(config, http, storage, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn DeviceStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let retry = RetryEngine::new(config.default_policy, config.rate_limit_policy);
        let pacer = config.requests_per_minute.map(RequestPacer::per_minute);
        Self {
            cache: PersistentCache::with_clock(storage, clock),
            config,
            http,
            retry,
            pacer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &PersistentCache {
        &self.cache
    }

    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl
    }

    pub async fn global_quote(
        &self,
        symbol: &Symbol,
    ) -> Result<Fetched<GlobalQuote>, ClassifiedError> {
        let call = EndpointCall::new("GLOBAL_QUOTE", format!("quote_{symbol}"))
            .param("symbol", symbol.as_str());
        self.fetch(call, shaping::quote).await
    }

    pub async fn company_overview(
        &self,
        symbol: &Symbol,
    ) -> Result<Fetched<CompanyOverview>, ClassifiedError> {
        let call = EndpointCall::new("OVERVIEW", format!("overview_{symbol}"))
            .param("symbol", symbol.as_str());
        self.fetch(call, shaping::company_overview).await
    }

    pub async fn time_series(
        &self,
        symbol: &Symbol,
        granularity: SeriesGranularity,
    ) -> Result<Fetched<TimeSeries>, ClassifiedError> {
        let mut call = EndpointCall::new(granularity.function(), granularity.cache_key(symbol))
            .param("symbol", symbol.as_str());
        if let Some(interval) = granularity.interval() {
            call = call.param("interval", interval.as_str());
        }
        self.fetch(call, shaping::time_series).await
    }

    pub async fn news(&self, query: &NewsQuery) -> Result<Fetched<NewsFeed>, ClassifiedError> {
        let mut call = EndpointCall::new("NEWS_SENTIMENT", query.cache_key())
            .param("limit", query.limit().to_string())
            .param("sort", "LATEST")
            .timeout_ms(NEWS_TIMEOUT_MS);
        if let Some(tickers) = query.tickers_param() {
            call = call.param("tickers", tickers);
        }
        if let Some(topics) = query.topics_param() {
            call = call.param("topics", topics);
        }
        self.fetch(call, shaping::news).await
    }

    pub async fn search_symbol(
        &self,
        keywords: &str,
    ) -> Result<Fetched<SymbolSearch>, ClassifiedError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(ClassifiedError::data_not_available(
                ValidationError::EmptyKeywords.to_string(),
            ));
        }
        let call = EndpointCall::new(
            "SYMBOL_SEARCH",
            format!("search_{}", keywords.to_lowercase()),
        )
        .param("keywords", keywords)
        .max_attempts(LOOKUP_MAX_ATTEMPTS);
        self.fetch(call, shaping::symbol_search).await
    }

    pub async fn market_status(&self) -> Result<Fetched<MarketStatus>, ClassifiedError> {
        let call = EndpointCall::new("MARKET_STATUS", String::from("market_status"))
            .max_attempts(LOOKUP_MAX_ATTEMPTS);
        self.fetch(call, shaping::market_status).await
    }

    pub async fn earnings(&self, symbol: &Symbol) -> Result<Fetched<Earnings>, ClassifiedError> {
        let call = EndpointCall::new("EARNINGS", format!("earnings_{symbol}"))
            .param("symbol", symbol.as_str());
        self.fetch(call, shaping::earnings).await
    }

    pub async fn top_movers(&self) -> Result<Fetched<TopMovers>, ClassifiedError> {
        let call = EndpointCall::new("TOP_GAINERS_LOSERS", String::from("top_movers"));
        self.fetch(call, shaping::top_movers).await
    }

    async fn fetch<T, S>(&self, call: EndpointCall, shape: S) -> Result<Fetched<T>, ClassifiedError>
    where
        T: Serialize + DeserializeOwned,
        S: Fn(Value) -> Result<T, ClassifiedError>,
    {
        let key = call.cache_key.as_str();

        // The expired entry is not evicted here: it is the fallback if every
        // attempt fails.
        let now = self.cache.now_epoch_millis();
        let expired = match self.cache.get::<T>(key).await {
            Some(entry) if entry.is_fresh(self.config.cache_ttl, now) => {
                debug!(key, age_ms = entry.age_millis(now), "cache hit");
                return Ok(Fetched {
                    value: entry.value,
                    origin: DataOrigin::Cache,
                });
            }
            Some(entry) => {
                debug!(key, age_ms = entry.age_millis(now), "cache entry expired");
                Some(entry.value)
            }
            None => None,
        };
        debug!(key, function = call.function, "calling upstream");

        let request = self.build_request(&call);
        let request = &request;
        let shape = &shape;
        let function = call.function;
        let outcome = self
            .retry
            .execute(
                move |attempt| self.attempt(function, request, attempt, shape),
                call.max_attempts,
            )
            .await;

        match outcome {
            Ok(value) => {
                self.cache.put(key, &value).await;
                Ok(Fetched {
                    value,
                    origin: DataOrigin::Upstream,
                })
            }
            Err(error) => match self.cache.get_stale::<T>(key).await.or(expired) {
                Some(value) => {
                    warn!(
                        key,
                        kind = %error.kind(),
                        error = %error.message(),
                        "upstream failed; serving stale cache entry"
                    );
                    Ok(Fetched {
                        value,
                        origin: DataOrigin::Stale { error },
                    })
                }
                None => Err(error),
            },
        }
    }

    async fn attempt<T, S>(
        &self,
        function: &'static str,
        request: &HttpRequest,
        attempt: u32,
        shape: &S,
    ) -> Result<T, ClassifiedError>
    where
        S: Fn(Value) -> Result<T, ClassifiedError>,
    {
        if let Some(pacer) = &self.pacer {
            pacer.ready().await;
        }

        debug!(function, attempt, url = %request.redacted_url(), "sending upstream request");
        let body = classify(self.http.execute(request.clone()).await)?;
        shape(body)
    }

    fn build_request(&self, call: &EndpointCall) -> HttpRequest {
        let mut request = HttpRequest::get(self.config.base_url.as_str())
            .with_query("function", call.function)
            .with_timeout_ms(call.timeout_ms);
        for (name, value) in &call.params {
            request = request.with_query(*name, value.as_str());
        }
        request.with_query("apikey", self.config.api_key.as_str())
    }
}
