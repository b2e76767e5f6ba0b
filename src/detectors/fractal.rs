//! Fractal detection (local turning points)
//!
//! A candle at `index` is checked against its neighbours at `index ± o` for every
//! offset `o` in `1..=radius`, where `radius = (width - 1) / 2`:
//!
//! - up fractal: every neighbour low is strictly above the center low
//! - down fractal: every neighbour high is strictly below the center high
//!
//! Each neighbour is compared to the center only. Lookups use [`resolve`], so a
//! negative position reaches from the end of the slice.
//!
//! Outcomes:
//! - `None`: width is even or below 3, or a candle at some offset can't be
//!   resolved (the scan stops there)
//! - `Some(false)`: the first offset whose pair fails the comparison
//! - `Some(true)`: every offset passed

use rayon::prelude::*;

use super::helpers::resolve;
use crate::{FractalWidth, OHLCV};

/// Every fractal found in a slice, ascending indices
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FractalScan {
    pub up: Vec<usize>,
    pub down: Vec<usize>,
}

impl FractalScan {
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}

/// Check whether the candle at `index` is an up fractal of the given width (default 3).
pub fn is_up_fractal<T: OHLCV>(bars: &[T], index: isize, width: Option<usize>) -> Option<bool> {
    check_fractal(bars, index, width, |center, neighbour| {
        center.low() < neighbour.low()
    })
}

/// Check whether the candle at `index` is a down fractal of the given width (default 3).
pub fn is_down_fractal<T: OHLCV>(bars: &[T], index: isize, width: Option<usize>) -> Option<bool> {
    check_fractal(bars, index, width, |center, neighbour| {
        center.high() > neighbour.high()
    })
}

/// Find all up and down fractals of the given width (default 3).
///
/// Only candles whose whole neighbourhood lies inside the slice are considered,
/// so no lookup wraps around the end. An invalid width yields an empty scan.
pub fn scan_fractals<T: OHLCV + Sync>(bars: &[T], width: Option<usize>) -> FractalScan {
    let Ok(width) = FractalWidth::from_option(width) else {
        return FractalScan::default();
    };
    let radius = width.radius();
    if bars.len() <= radius * 2 {
        return FractalScan::default();
    }
    let candidates = radius..bars.len() - radius;

    let up = candidates
        .clone()
        .into_par_iter()
        .filter(|&i| is_up_fractal(bars, i as isize, Some(width.get())) == Some(true))
        .collect();
    let down = candidates
        .into_par_iter()
        .filter(|&i| is_down_fractal(bars, i as isize, Some(width.get())) == Some(true))
        .collect();

    FractalScan { up, down }
}

fn check_fractal<T: OHLCV>(
    bars: &[T],
    index: isize,
    width: Option<usize>,
    beats: impl Fn(&T, &T) -> bool,
) -> Option<bool> {
    let width = FractalWidth::from_option(width).ok()?;
    let center = resolve(bars, index);

    for offset in 1..=width.radius() {
        let offset = isize::try_from(offset).ok()?;
        let after = index.checked_add(offset).and_then(|i| resolve(bars, i));
        let before = index.checked_sub(offset).and_then(|i| resolve(bars, i));

        let (Some(center), Some(after), Some(before)) = (center, after, before) else {
            return None;
        };

        if !beats(center, after) || !beats(center, before) {
            return Some(false);
        }
    }

    Some(true)
}
