//! # Plutus - multi-interval candlestick analysis
//!
//! Read-only technical analysis over historical klines of a single trading pair:
//! candle classification, windowed extrema search and fractal detection.
//!
//! ## Quick Start
//!
//! ```rust
//! use plutus::prelude::*;
//! use serde_json::json;
//!
//! let source = StaticSource::new(SourceOrder::OldestFirst).with_klines(
//!     Interval::OneHour,
//!     vec![
//!         json!([0, "10.0", "12.0", "9.0", "11.0", "1.0"]),
//!         json!([1, "11.0", "11.5", "8.0", "10.0", "1.0"]),
//!         json!([2, "10.0", "13.0", "9.5", "12.5", "1.0"]),
//!     ],
//! );
//!
//! let series = SeriesBuilder::new()
//!     .symbol("BTCUSDT")
//!     .start("October 8, 2021")
//!     .interval(Interval::OneHour)
//!     .build(source)
//!     .unwrap();
//!
//! assert_eq!(series.highest_high(Interval::OneHour, None, None).unwrap(), Some(2));
//! assert_eq!(series.is_up_fractal(Interval::OneHour, 1, None).unwrap(), Some(true));
//! ```

pub mod candle;
pub mod detectors;
pub mod interval;
pub mod series;
pub mod source;

pub use candle::{Candle, RawKline};
pub use interval::Interval;
pub use detectors::FractalScan;
pub use series::{CandleSeries, SeriesBuilder, SeriesConfig};
pub use source::{KlineSource, SourceError, SourceOrder, StaticSource};

pub mod prelude {
    pub use crate::{
        // Data
        candle::{Candle, RawKline},
        // Detectors
        detectors::{
            highest_high, is_down_fractal, is_up_fractal, lowest_low, resolve, scan_fractals,
            FractalScan,
        },
        interval::Interval,
        // Series
        series::{CandleSeries, SeriesBuilder, SeriesConfig},
        // Sources
        source::{KlineSource, SourceError, SourceOrder, StaticSource},
        // Types
        FractalWidth,
        OHLCVExt,
        Result,
        SeriesError,
        OHLCV,
    };
}

use rust_decimal::Decimal;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SeriesError>;

/// Errors that can occur while loading or configuring a series
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed kline at index {index}: {reason}")]
    MalformedKline { index: usize, reason: String },

    /// Failure reported by the data source, passed through untouched.
    #[error(transparent)]
    Source(SourceError),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Fractal width: odd number of candles, at least 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FractalWidth(usize);

impl FractalWidth {
    pub const DEFAULT: FractalWidth = FractalWidth(3);

    /// Create a new FractalWidth, validating the value is odd and >= 3
    pub fn new(value: usize) -> Result<Self> {
        if value < 3 {
            return Err(SeriesError::InvalidValue("FractalWidth must be >= 3"));
        }
        if value % 2 == 0 {
            return Err(SeriesError::InvalidValue("FractalWidth must be odd"));
        }
        Ok(Self(value))
    }

    /// Resolve an optional caller-supplied width; unset and zero both mean the default.
    pub fn from_option(value: Option<usize>) -> Result<Self> {
        match value {
            None | Some(0) => Ok(Self::DEFAULT),
            Some(v) => Self::new(v),
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Candles checked on each side of the center
    #[inline]
    pub fn radius(self) -> usize {
        (self.0 - 1) / 2
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait, exact decimal prices
pub trait OHLCV {
    fn open(&self) -> Decimal;
    fn high(&self) -> Decimal;
    fn low(&self) -> Decimal;
    fn close(&self) -> Decimal;
    fn volume(&self) -> Decimal;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

impl<T: OHLCV + ?Sized> OHLCV for &T {
    fn open(&self) -> Decimal {
        (**self).open()
    }

    fn high(&self) -> Decimal {
        (**self).high()
    }

    fn low(&self) -> Decimal {
        (**self).low()
    }

    fn close(&self) -> Decimal {
        (**self).close()
    }

    fn volume(&self) -> Decimal {
        (**self).volume()
    }

    fn timestamp(&self) -> Option<i64> {
        (**self).timestamp()
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    /// Close strictly above open
    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    /// Close strictly below open
    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }
}

impl<T: OHLCV + ?Sized> OHLCVExt for T {}

// ============================================================
// TESTS
// ============================================================
