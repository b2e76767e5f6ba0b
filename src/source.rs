//! Kline data sources
//!
//! A [`KlineSource`] is the only I/O boundary of the crate: given a symbol, an
//! interval and a start marker it returns raw kline records. Network clients live
//! outside this crate and implement the trait; [`StaticSource`] serves records
//! held in memory.

use std::collections::HashMap;

use crate::candle::RawKline;
use crate::interval::Interval;

/// Error type returned by data sources, propagated to callers untouched
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Chronological order of the records a source returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceOrder {
    /// Records are already in series order
    #[default]
    OldestFirst,
    /// Records are reversed before being cached
    NewestFirst,
}

/// Provider of historical klines
pub trait KlineSource {
    /// Order in which [`fetch`](KlineSource::fetch) returns records
    fn order(&self) -> SourceOrder;

    /// Fetch every kline for `symbol` at `interval` starting from `start`
    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        start: &str,
    ) -> std::result::Result<Vec<RawKline>, SourceError>;
}

impl<S: KlineSource + ?Sized> KlineSource for &S {
    fn order(&self) -> SourceOrder {
        (**self).order()
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        start: &str,
    ) -> std::result::Result<Vec<RawKline>, SourceError> {
        (**self).fetch(symbol, interval, start)
    }
}

impl<S: KlineSource + ?Sized> KlineSource for Box<S> {
    fn order(&self) -> SourceOrder {
        (**self).order()
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        start: &str,
    ) -> std::result::Result<Vec<RawKline>, SourceError> {
        (**self).fetch(symbol, interval, start)
    }
}

/// In-memory source serving fixed records per interval.
///
/// Symbol and start marker are ignored. Intervals without records yield an empty list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    order: SourceOrder,
    klines: HashMap<Interval, Vec<RawKline>>,
}

impl StaticSource {
    pub fn new(order: SourceOrder) -> Self {
        Self {
            order,
            klines: HashMap::new(),
        }
    }

    /// Add (or replace) the records served for `interval`
    pub fn with_klines(mut self, interval: Interval, klines: Vec<RawKline>) -> Self {
        self.klines.insert(interval, klines);
        self
    }
}

impl KlineSource for StaticSource {
    fn order(&self) -> SourceOrder {
        self.order
    }

    fn fetch(
        &self,
        _symbol: &str,
        interval: Interval,
        _start: &str,
    ) -> std::result::Result<Vec<RawKline>, SourceError> {
        Ok(self.klines.get(&interval).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_source_serves_configured_interval() {
        let source = StaticSource::new(SourceOrder::NewestFirst).with_klines(
            Interval::OneDay,
            vec![json!([0, "1", "2", "0", "1", "5"])],
        );

        assert_eq!(source.order(), SourceOrder::NewestFirst);
        assert_eq!(source.fetch("ETHUSDT", Interval::OneDay, "1 day ago").unwrap().len(), 1);
        assert!(source.fetch("ETHUSDT", Interval::OneHour, "1 day ago").unwrap().is_empty());
    }

    #[test]
    fn test_boxed_source_delegates() {
        let source: Box<dyn KlineSource> = Box::new(StaticSource::default());
        assert_eq!(source.order(), SourceOrder::OldestFirst);
        assert!(source.fetch("BTCUSDT", Interval::OneMinute, "").unwrap().is_empty());
    }
}
