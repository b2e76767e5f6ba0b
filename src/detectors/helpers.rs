//! Index resolution shared by the detectors

/// Look up the candle at a signed index.
///
/// Non-negative indices count from the start, negative ones from the end.
/// Returns `None` for `index >= len` or `index < -len`.
#[inline]
pub fn resolve<T>(bars: &[T], index: isize) -> Option<&T> {
    let position = if index < 0 {
        bars.len().checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    bars.get(position)
}

/// Clip the window `[start, start + count)` to the slice.
///
/// Unset and zero are equivalent for both parameters: `start` falls back to 0
/// and `count` to the full length of `bars`. Returns `None` when `count`
/// exceeds the slice length or the clipped window is empty.
pub fn window<T>(bars: &[T], start: Option<usize>, count: Option<usize>) -> Option<&[T]> {
    let start = start.unwrap_or(0);
    let count = match count {
        None | Some(0) => bars.len(),
        Some(count) => count,
    };

    if count > bars.len() {
        return None;
    }

    let end = start.saturating_add(count).min(bars.len());
    let slice = bars.get(start..end)?;
    (!slice.is_empty()).then_some(slice)
}
