//! Slice-level analysis primitives
//!
//! Everything here works on any `&[T: OHLCV]`, so the logic can be used without
//! a data source. [`CandleSeries`](crate::CandleSeries) delegates to these functions.
//!
//! # Index conventions
//!
//! - Single-candle lookups take an `isize`: negative values address from the end
//!   (`-1` is the last candle). See [`resolve`].
//! - Extrema searches return positions in the full slice, never window-relative.

pub mod extrema;
pub mod fractal;
pub mod helpers;

pub use extrema::*;
pub use fractal::*;
pub use helpers::*;
