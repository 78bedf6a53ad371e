//! # StockPulse Core
//!
//! Resilient client for the Alpha Vantage market data API.
//!
//! ## Overview
//!
//! The upstream is rate limited, slow at times, and reports most failures as
//! HTTP 200 bodies carrying a notice. This crate keeps callers usable through
//! all of that:
//!
//! - **Persistent cache** with a TTL, lazy eviction and stale reads
//! - **Error classifier** mapping responses onto a closed [`ErrorKind`] set
//! - **Retry engine** with exponential backoff and a long-wait policy for
//!   rate limits
//! - **Endpoint client** wiring the three together per endpoint, falling back
//!   to stale cached data when the upstream keeps failing
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache over device storage |
//! | [`classifier`] | Response and transport error classification |
//! | [`client`] | Endpoint methods and the fetch flow |
//! | [`config`] | Client configuration from the environment |
//! | [`domain`] | Validated request parameters |
//! | [`error`] | Error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`models`] | Typed response payloads |
//! | [`pacing`] | Optional client-side request budget |
//! | [`retry`] | Retry policies and engine |
//! | [`shaping`] | Response body to payload conversion |
//! | [`storage`] | Async key/value device storage |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockpulse_core::{
//!     ClientConfig, MemoryStorage, ReqwestHttpClient, StockDataClient, Symbol,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StockDataClient::new(
//!         ClientConfig::from_env()?,
//!         Arc::new(ReqwestHttpClient::new()),
//!         Arc::new(MemoryStorage::new()),
//!     );
//!
//!     let quote = client.global_quote(&Symbol::parse("AAPL")?).await?;
//!     if quote.is_stale() {
//!         eprintln!("data may be outdated");
//!     }
//!     println!("AAPL {}", quote.value.price);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use stockpulse_core::{ClassifiedError, ErrorKind};
//!
//! fn describe(error: &ClassifiedError) -> &'static str {
//!     match error.kind() {
//!         ErrorKind::InvalidCredentials => "check your API key",
//!         ErrorKind::RateLimit => "too many requests, try again later",
//!         ErrorKind::DataNotAvailable => "no data for this request",
//!         _ => "temporary problem, try again",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The API key is only sent as a query parameter; it is never logged and is
//!   stripped from transport error messages

pub mod cache;
pub mod classifier;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod models;
pub mod pacing;
pub mod retry;
pub mod shaping;
pub mod storage;

// Caching
pub use cache::{
    CacheEntry, Clock, ManualClock, PersistentCache, SystemClock, CACHE_NAMESPACE,
    DEFAULT_CACHE_TTL,
};

// Classification
pub use classifier::classify;

// Endpoint client
pub use client::{DataOrigin, Fetched, StockDataClient};

// Configuration
pub use config::ClientConfig;

// Domain primitives
pub use domain::{Interval, NewsQuery, SeriesGranularity, Symbol};

// Error types
pub use error::{ClassifiedError, ConfigError, ErrorKind, StorageError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Payloads
pub use models::{
    AnnualEarnings, CompanyOverview, Earnings, GlobalQuote, MarketMover, MarketSession,
    MarketStatus, NewsArticle, NewsFeed, QuarterlyEarnings, SeriesBar, SeriesMeta, SymbolMatch,
    SymbolSearch, TickerSentiment, TimeSeries, TopMovers, TopicRelevance,
};

// Pacing
pub use pacing::RequestPacer;

// Retry logic
pub use retry::{RetryEngine, RetryPolicy};

// Device storage
pub use storage::{DeviceStorage, DuckDbStorage, MemoryStorage, StorageFuture};
