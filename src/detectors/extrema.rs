//! Windowed extrema search: highest high, lowest low
//!
//! The window is `[start, start + count)`. The extreme value is taken from the
//! window, then located by scanning the full slice from index 0, so ties resolve
//! to the lowest absolute index holding that value, which can lie before `start`.

use rust_decimal::Decimal;

use super::helpers::window;
use crate::OHLCV;

/// Index of the candle with the highest high in the window.
///
/// Returns `None` when `count` exceeds `bars.len()` or the window is empty.
pub fn highest_high<T: OHLCV>(
    bars: &[T],
    start: Option<usize>,
    count: Option<usize>,
) -> Option<usize> {
    let max = window(bars, start, count)?.iter().map(|bar| bar.high()).max()?;
    first_position(bars, |bar| bar.high(), max)
}

/// Index of the candle with the lowest low in the window.
///
/// Returns `None` when `count` exceeds `bars.len()` or the window is empty.
pub fn lowest_low<T: OHLCV>(
    bars: &[T],
    start: Option<usize>,
    count: Option<usize>,
) -> Option<usize> {
    let min = window(bars, start, count)?.iter().map(|bar| bar.low()).min()?;
    first_position(bars, |bar| bar.low(), min)
}

#[inline]
fn first_position<T: OHLCV>(
    bars: &[T],
    price: impl Fn(&T) -> Decimal,
    value: Decimal,
) -> Option<usize> {
    bars.iter().position(|bar| price(bar) == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Clone, Copy)]
    struct Bar {
        h: Decimal,
        l: Decimal,
    }

    impl OHLCV for Bar {
        fn open(&self) -> Decimal {
            self.l
        }

        fn high(&self) -> Decimal {
            self.h
        }

        fn low(&self) -> Decimal {
            self.l
        }

        fn close(&self) -> Decimal {
            self.h
        }

        fn volume(&self) -> Decimal {
            Decimal::ONE
        }
    }

    fn bars(hl: &[(Decimal, Decimal)]) -> Vec<Bar> {
        hl.iter().map(|&(h, l)| Bar { h, l }).collect()
    }

    /// Highs 53940.00, 54429.99, 54397.00, 54235.99
    fn btc_hourly() -> Vec<Bar> {
        bars(&[
            (dec!(53940.00), dec!(53691.02)),
            (dec!(54429.99), dec!(53776.50)),
            (dec!(54397.00), dec!(54051.10)),
            (dec!(54235.99), dec!(53711.57)),
        ])
    }

    #[test]
    fn test_highest_high_full_series() {
        assert_eq!(highest_high(&btc_hourly(), None, None), Some(1));
    }

    #[test]
    fn test_highest_high_with_start() {
        assert_eq!(highest_high(&btc_hourly(), Some(2), None), Some(2));
    }

    #[test]
    fn test_highest_high_with_count() {
        assert_eq!(highest_high(&btc_hourly(), Some(0), Some(3)), Some(1));
        assert_eq!(highest_high(&btc_hourly(), Some(2), Some(1)), Some(2));
    }

    #[test]
    fn test_lowest_low() {
        let data = btc_hourly();
        assert_eq!(lowest_low(&data, None, None), Some(0));
        assert_eq!(lowest_low(&data, Some(2), None), Some(3));
        assert_eq!(lowest_low(&data, Some(0), Some(3)), Some(0));
        assert_eq!(lowest_low(&data, Some(1), Some(2)), Some(1));
    }

    #[test]
    fn test_count_larger_than_series_is_not_clamped() {
        let data = btc_hourly();
        assert_eq!(highest_high(&data, None, Some(5)), None);
        assert_eq!(lowest_low(&data, Some(3), Some(100)), None);
    }

    #[test]
    fn test_window_past_end_is_clipped() {
        let data = btc_hourly();
        assert_eq!(highest_high(&data, Some(3), Some(4)), Some(3));
        assert_eq!(highest_high(&data, Some(100), None), None);
        assert_eq!(lowest_low(&data, Some(4), Some(1)), None);
    }

    #[test]
    fn test_empty_slice() {
        let data: Vec<Bar> = Vec::new();
        assert_eq!(highest_high(&data, None, None), None);
        assert_eq!(lowest_low(&data, None, None), None);
    }

    #[test]
    fn test_ties_resolve_to_first_absolute_index() {
        let data = bars(&[
            (dec!(5), dec!(1)),
            (dec!(9), dec!(2)),
            (dec!(9.00), dec!(2)),
            (dec!(7), dec!(3)),
        ]);
        assert_eq!(highest_high(&data, None, None), Some(1));
        // The window's maximum also appears before the window
        assert_eq!(highest_high(&data, Some(2), None), Some(1));
        assert_eq!(lowest_low(&data, Some(2), Some(1)), Some(1));
    }

    #[test]
    fn test_fractional_cents_are_compared_exactly() {
        let data = bars(&[
            (dec!(0.30000001), dec!(0.1)),
            (dec!(0.30000002), dec!(0.1)),
        ]);
        assert_eq!(highest_high(&data, None, None), Some(1));
    }
}
