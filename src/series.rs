//! Per-pair candle series with lazily loaded intervals
//!
//! A [`CandleSeries`] serves a fixed set of intervals. Each interval's candles are
//! fetched from the [`KlineSource`] on first access and cached for the lifetime of
//! the series; later queries never refetch. Concurrent first access fetches at
//! most once per interval.

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::detectors::{self, FractalScan};
use crate::interval::Interval;
use crate::source::{KlineSource, SourceOrder};
use crate::{FractalWidth, OHLCVExt, Result, SeriesError};

// ============================================================
// CONFIG
// ============================================================

fn all_intervals() -> Vec<Interval> {
    Interval::ALL.to_vec()
}

/// Series configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Trading pair, e.g. `"BTCUSDT"`
    pub symbol: String,
    /// Start marker passed verbatim to the source, e.g. `"October 8, 2021"`
    #[serde(default)]
    pub start: String,
    #[serde(default = "all_intervals")]
    pub intervals: Vec<Interval>,
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating CandleSeries instances
#[derive(Debug, Clone, Default)]
pub struct SeriesBuilder {
    symbol: String,
    start: String,
    intervals: Vec<Interval>,
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SeriesConfig) -> Self {
        Self {
            symbol: config.symbol,
            start: config.start,
            intervals: config.intervals,
        }
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    /// Serve one more interval
    pub fn interval(mut self, interval: Interval) -> Self {
        self.intervals.push(interval);
        self
    }

    /// Serve these intervals in addition to any already added
    pub fn intervals(mut self, intervals: impl IntoIterator<Item = Interval>) -> Self {
        self.intervals.extend(intervals);
        self
    }

    /// Serve every supported interval
    pub fn all_intervals(self) -> Self {
        self.intervals(Interval::ALL)
    }

    pub fn build<S: KlineSource>(self, source: S) -> Result<CandleSeries<S>> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(SeriesError::InvalidConfig("symbol must not be empty".into()));
        }
        if self.intervals.is_empty() {
            return Err(SeriesError::InvalidConfig(
                "at least one interval is required".into(),
            ));
        }

        let slots = self
            .intervals
            .into_iter()
            .map(|interval| (interval, Slot::default()))
            .collect();

        Ok(CandleSeries {
            symbol: symbol.to_string(),
            start: self.start,
            source,
            slots,
        })
    }
}

// ============================================================
// CANDLE SERIES
// ============================================================

/// Cached candles of one interval plus the guard serializing its first fetch
#[derive(Debug, Default)]
struct Slot {
    candles: OnceLock<Vec<Candle>>,
    init: Mutex<()>,
}

/// Historical candles of one trading pair across intervals.
///
/// Query methods return `Result<Option<_>>`: `Err` only when loading the interval
/// fails, `None` when there is no answer (index out of range, empty window,
/// invalid fractal width, unresolvable neighbour).
#[derive(Debug)]
pub struct CandleSeries<S: KlineSource> {
    symbol: String,
    start: String,
    source: S,
    slots: BTreeMap<Interval, Slot>,
}

impl<S: KlineSource> CandleSeries<S> {
    /// Series over every supported interval
    pub fn new(symbol: impl Into<String>, start: impl Into<String>, source: S) -> Result<Self> {
        SeriesBuilder::new()
            .symbol(symbol)
            .start(start)
            .all_intervals()
            .build(source)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Configured intervals, shortest first
    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.slots.keys().copied()
    }

    /// Whether `interval` has already been fetched
    pub fn is_loaded(&self, interval: Interval) -> bool {
        self.slots
            .get(&interval)
            .is_some_and(|slot| slot.candles.get().is_some())
    }

    // ===========================================
    // DATA ACCESS
    // ===========================================

    /// Candles of `interval`, fetched on first call and cached afterwards.
    ///
    /// Intervals outside the configured set yield an empty slice.
    pub fn sequence_for(&self, interval: Interval) -> Result<&[Candle]> {
        let Some(slot) = self.slots.get(&interval) else {
            return Ok(Default::default());
        };
        if let Some(candles) = slot.candles.get() {
            return Ok(candles.as_slice());
        }

        let _guard = slot.init.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished the fetch while we waited
        if let Some(candles) = slot.candles.get() {
            return Ok(candles.as_slice());
        }

        let candles = self.fetch(interval)?;
        Ok(slot.candles.get_or_init(|| candles).as_slice())
    }

    /// Number of candles in `interval`
    pub fn len(&self, interval: Interval) -> Result<usize> {
        Ok(self.sequence_for(interval)?.len())
    }

    pub fn is_empty(&self, interval: Interval) -> Result<bool> {
        Ok(self.sequence_for(interval)?.is_empty())
    }

    /// Fetch every configured interval that isn't cached yet, in parallel.
    pub fn preload(&self) -> Result<()>
    where
        S: Sync,
    {
        let intervals: Vec<Interval> = self.intervals().collect();
        intervals
            .into_par_iter()
            .try_for_each(|interval| self.sequence_for(interval).map(|_| ()))
    }

    /// Candle at `index`; negative indices count from the end.
    pub fn get_candle(&self, interval: Interval, index: isize) -> Result<Option<&Candle>> {
        Ok(detectors::resolve(self.sequence_for(interval)?, index))
    }

    // ===========================================
    // CLASSIFICATION
    // ===========================================

    /// Close above open; `None` if the candle can't be resolved
    pub fn is_bullish(&self, interval: Interval, index: isize) -> Result<Option<bool>> {
        Ok(self.get_candle(interval, index)?.map(|c| c.is_bullish()))
    }

    /// Close below open; `None` if the candle can't be resolved
    pub fn is_bearish(&self, interval: Interval, index: isize) -> Result<Option<bool>> {
        Ok(self.get_candle(interval, index)?.map(|c| c.is_bearish()))
    }

    // ===========================================
    // EXTREMA
    // ===========================================

    /// Absolute index of the highest high in `[start, start + count)`.
    ///
    /// `start` unset or 0 searches from the first candle; `count` unset or 0
    /// covers the whole series. A `count` beyond the series length gives `None`.
    pub fn highest_high(
        &self,
        interval: Interval,
        start: Option<usize>,
        count: Option<usize>,
    ) -> Result<Option<usize>> {
        Ok(detectors::highest_high(
            self.sequence_for(interval)?,
            start,
            count,
        ))
    }

    /// Absolute index of the lowest low in `[start, start + count)`.
    ///
    /// Same window rules as [`highest_high`](Self::highest_high).
    pub fn lowest_low(
        &self,
        interval: Interval,
        start: Option<usize>,
        count: Option<usize>,
    ) -> Result<Option<usize>> {
        Ok(detectors::lowest_low(
            self.sequence_for(interval)?,
            start,
            count,
        ))
    }

    // ===========================================
    // FRACTALS
    // ===========================================

    /// Up fractal of width `count` (odd, >= 3, default 3) centered on `index`
    pub fn is_up_fractal(
        &self,
        interval: Interval,
        index: isize,
        count: Option<usize>,
    ) -> Result<Option<bool>> {
        if FractalWidth::from_option(count).is_err() {
            return Ok(None);
        }
        Ok(detectors::is_up_fractal(
            self.sequence_for(interval)?,
            index,
            count,
        ))
    }

    /// Down fractal of width `count` (odd, >= 3, default 3) centered on `index`
    pub fn is_down_fractal(
        &self,
        interval: Interval,
        index: isize,
        count: Option<usize>,
    ) -> Result<Option<bool>> {
        if FractalWidth::from_option(count).is_err() {
            return Ok(None);
        }
        Ok(detectors::is_down_fractal(
            self.sequence_for(interval)?,
            index,
            count,
        ))
    }

    /// All fractals of `interval` whose neighbourhood fits inside the series
    pub fn scan_fractals(&self, interval: Interval, count: Option<usize>) -> Result<FractalScan> {
        if FractalWidth::from_option(count).is_err() {
            return Ok(FractalScan::default());
        }
        Ok(detectors::scan_fractals(
            self.sequence_for(interval)?,
            count,
        ))
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn fetch(&self, interval: Interval) -> Result<Vec<Candle>> {
        let order = self.source.order();
        let raw = self
            .source
            .fetch(&self.symbol, interval, &self.start)
            .map_err(|e| {
                tracing::warn!(symbol = %self.symbol, %interval, error = %e, "kline fetch failed");
                SeriesError::Source(e)
            })?;

        let mut candles = raw
            .iter()
            .enumerate()
            .map(|(i, record)| {
                Candle::from_raw(record).map_err(|e| match e {
                    SeriesError::MalformedKline { reason, .. } => {
                        SeriesError::MalformedKline { index: i, reason }
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if order == SourceOrder::NewestFirst {
            candles.reverse();
        }

        tracing::debug!(
            symbol = %self.symbol,
            %interval,
            candles = candles.len(),
            ?order,
            "loaded klines"
        );

        Ok(candles)
    }
}

// ============================================================
// TESTS
// ============================================================
