//! # Domain Primitives
//!
//! Validated request parameters shared by the endpoint methods.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, uppercased ticker |
//! | [`Interval`] | Intraday bar width (1min .. 60min) |
//! | [`SeriesGranularity`] | Intraday, daily, weekly or monthly series |
//! | [`NewsQuery`] | Ticker/topic filter and limit for the news feed |
//!
//! Normalization happens at construction, so two requests that mean the same
//! thing always produce the same cache key.

mod interval;
mod news;
mod symbol;

pub use interval::{Interval, SeriesGranularity};
pub use news::NewsQuery;
pub use symbol::Symbol;
