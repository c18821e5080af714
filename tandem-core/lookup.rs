//! Shared lookup machinery for the anchor and interval mappings.
//!
//! Forward and reverse queries on both mapping kinds are the same algorithm
//! run over different field pairs, so the axis selection, the binary search
//! with nearest-neighbour fallback, and the interpolation step live here
//! once instead of four times.

use std::ops::Range;

/// Which side of a correspondence a lookup searches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
  Src,
  Out,
}

impl Axis {
  /// The opposite side, i.e. the side a query reports from.
  pub(crate) fn flip(self) -> Axis {
    match self {
      Axis::Src => Axis::Out,
      Axis::Out => Axis::Src,
    }
  }
}

/// Project `offset` from the `from` range onto the `to` range by linear
/// proportion, rounding half up.
///
/// The fraction is clamped to `[0, 1]`, so offsets outside `from` land on the
/// corresponding end of `to`. An empty `from` range maps its whole query
/// domain to `to.start`. All offsets involved are non-negative, so
/// `f64::round` (ties away from zero) and round half up coincide.
pub(crate) fn lerp_round(from: Range<usize>, to: Range<usize>, offset: usize) -> usize {
  debug_assert!(from.start <= from.end);
  debug_assert!(to.start <= to.end);

  if from.is_empty() {
    return to.start;
  }

  let t = offset.saturating_sub(from.start) as f64 / (from.end - from.start) as f64;
  let t = t.clamp(0.0, 1.0);
  (to.start as f64 + t * (to.end - to.start) as f64).round() as usize
}

/// Binary search a sorted sequence of half-open ranges for one containing
/// `offset`; on a miss, fall back to whichever neighbouring range has the
/// numerically closer boundary.
///
/// `key` maps a position in `0..len` to the range occupied on the searched
/// axis; the sequence must be sorted by `(start, end)`. Returns the selected
/// position, or `None` only when the sequence is empty. When several ranges
/// contain the offset (duplicated source spans), the last of them is
/// reported; callers that need the whole group expand it separately.
pub(crate) fn nearest_range_by<F>(len: usize, key: F, offset: usize) -> Option<usize>
where
  F: Fn(usize) -> Range<usize>,
{
  if len == 0 {
    return None;
  }

  // First position whose range starts past the query; the position before it
  // is the only candidate that can contain the query.
  let mut lo = 0;
  let mut hi = len;
  while lo < hi {
    let mid = (lo + hi) / 2;
    if key(mid).start <= offset {
      lo = mid + 1;
    } else {
      hi = mid;
    }
  }

  let prev = lo.checked_sub(1);
  let next = (lo < len).then_some(lo);

  if let Some(prev) = prev {
    if key(prev).contains(&offset) {
      return Some(prev);
    }
  }

  match (prev, next) {
    (Some(prev), Some(next)) => {
      // Both neighbours exist; the query sits in the gap between them, so
      // `offset >= prev.end` and `offset < next.start` both hold here.
      let before = offset - key(prev).end;
      let after = key(next).start - offset;
      Some(if before < after { prev } else { next })
    },
    (Some(prev), None) => Some(prev),
    (None, Some(next)) => Some(next),
    (None, None) => unreachable!("len checked above"),
  }
}
