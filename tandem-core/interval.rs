//! Interval-based offset correlation against structural dumps.
//!
//! A structural view (syntax tree dump, rendering IR) is a different textual
//! grammar whose fragments nonetheless correspond to exact source ranges, so
//! the external engine ships a list of range pairs instead of having us diff
//! text that shares no surface shape with the source. One source range may
//! map to several output ranges when the dump repeats a node reference; that
//! one-to-many relation is preserved as-is.

use std::{
  ops::Range,
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

use once_cell::sync::OnceCell;
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::lookup::{
  Axis,
  lerp_round,
  nearest_range_by,
};

/// A correspondence between a source span and a derived-text span, supplied
/// by the external formatting/parsing engine.
///
/// Field names serialize in `camelCase`, the wire shape the engine emits
/// across its JSON boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
  pub src_start: usize,
  pub src_end: usize,
  pub out_start: usize,
  pub out_end: usize,
}

impl Interval {
  pub fn new(src: Range<usize>, out: Range<usize>) -> Interval {
    Interval {
      src_start: src.start,
      src_end: src.end,
      out_start: out.start,
      out_end: out.end,
    }
  }

  pub fn src(&self) -> Range<usize> {
    self.src_start..self.src_end
  }

  pub fn out(&self) -> Range<usize> {
    self.out_start..self.out_end
  }

  /// Whether both intervals cover the same source range. Output ranges are
  /// deliberately not compared; duplicates of a source range are how the
  /// engine expresses one-to-many correspondences.
  pub fn same_source(&self, other: &Interval) -> bool {
    self.src_start == other.src_start && self.src_end == other.src_end
  }

  fn range(&self, axis: Axis) -> Range<usize> {
    match axis {
      Axis::Src => self.src(),
      Axis::Out => self.out(),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntervalMapError {
  #[error("interval {index} is inverted (start is past end)")]
  Inverted { index: usize },
  #[error("interval {index} is not sorted after its predecessor")]
  Unsorted { index: usize },
}

/// Generation source for interval maps. Never reused within a process, so a
/// rebuilt map can always be told apart from the one it replaces.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An immutable list of [`Interval`]s sorted by source range, with a lazily
/// built secondary ordering for output-side lookups.
///
/// The supplying engine produces a fresh list per parse/format run; wrapping
/// it stamps a process-unique generation, so anything a caller keyed on the
/// previous generation is implicitly stale without explicit invalidation.
/// The output-sorted index is built on the first output-side query and cached
/// for the lifetime of the map; the interval list itself is never reordered.
#[derive(Debug)]
pub struct IntervalMap {
  intervals: Vec<Interval>,
  generation: u64,
  by_out: OnceCell<Vec<u32>>,
}

impl IntervalMap {
  /// Wrap an engine-supplied interval list.
  ///
  /// The list must be sorted by `(src_start, src_end)`, the order the
  /// engine contractually emits, and every interval must have
  /// `start <= end` on both sides. Violations are reported rather than
  /// repaired; silently reordering the caller's data would desynchronize it
  /// from whatever the engine paired the list with.
  pub fn new(intervals: Vec<Interval>) -> Result<IntervalMap, IntervalMapError> {
    for (index, interval) in intervals.iter().enumerate() {
      if interval.src_start > interval.src_end || interval.out_start > interval.out_end {
        return Err(IntervalMapError::Inverted { index });
      }
    }
    for (index, pair) in intervals.windows(2).enumerate() {
      let sorted = (pair[0].src_start, pair[0].src_end) <= (pair[1].src_start, pair[1].src_end);
      if !sorted {
        return Err(IntervalMapError::Unsorted { index: index + 1 });
      }
    }

    Ok(IntervalMap {
      intervals,
      generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
      by_out: OnceCell::new(),
    })
  }

  /// Process-unique identity of this map instance.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn intervals(&self) -> &[Interval] {
    &self.intervals
  }

  pub fn len(&self) -> usize {
    self.intervals.len()
  }

  pub fn is_empty(&self) -> bool {
    self.intervals.is_empty()
  }

  /// Map a source offset to the corresponding derived-text offset.
  pub fn src_to_out(&self, offset: usize) -> usize {
    self.project(Axis::Src, offset)
  }

  /// Map a derived-text offset back to the corresponding source offset.
  pub fn out_to_src(&self, offset: usize) -> usize {
    self.project(Axis::Out, offset)
  }

  /// The interval containing (or, in a gap, nearest to) a source offset.
  ///
  /// Returning the interval rather than a bare offset lets callers gather
  /// every interval sharing its source range via [`IntervalMap::same_source`]
  /// for one-to-many highlighting.
  pub fn find_at_src(&self, offset: usize) -> Option<&Interval> {
    self.locate(Axis::Src, offset)
  }

  /// The interval containing (or nearest to) a derived-text offset.
  pub fn find_at_out(&self, offset: usize) -> Option<&Interval> {
    self.locate(Axis::Out, offset)
  }

  /// All intervals covering the same source range as `interval`, in list
  /// order. Includes `interval` itself.
  pub fn same_source<'a>(&'a self, interval: &'a Interval) -> impl Iterator<Item = &'a Interval> {
    self
      .intervals
      .iter()
      .filter(move |other| other.same_source(interval))
  }

  /// Map a source range to the derived text, endpoint by endpoint.
  pub fn map_range_src_to_out(&self, range: Range<usize>) -> Range<usize> {
    ordered(self.src_to_out(range.start), self.src_to_out(range.end))
  }

  /// Map a derived-text range back to the source, endpoint by endpoint.
  pub fn map_range_out_to_src(&self, range: Range<usize>) -> Range<usize> {
    ordered(self.out_to_src(range.start), self.out_to_src(range.end))
  }

  /// Positions of `intervals` reordered by `(out_start, out_end)`, built on
  /// first use. Never sorts the interval list in place.
  fn by_out(&self) -> &[u32] {
    self.by_out.get_or_init(|| {
      let mut order: Vec<u32> = (0..self.intervals.len() as u32).collect();
      order.sort_by_key(|&pos| {
        let interval = &self.intervals[pos as usize];
        (interval.out_start, interval.out_end)
      });
      order
    })
  }

  fn locate(&self, axis: Axis, offset: usize) -> Option<&Interval> {
    match axis {
      Axis::Src => {
        nearest_range_by(self.intervals.len(), |pos| self.intervals[pos].src(), offset)
          .map(|pos| &self.intervals[pos])
      },
      Axis::Out => {
        let order = self.by_out();
        nearest_range_by(
          order.len(),
          |pos| self.intervals[order[pos] as usize].out(),
          offset,
        )
        .map(|pos| &self.intervals[order[pos] as usize])
      },
    }
  }

  fn project(&self, axis: Axis, offset: usize) -> usize {
    match self.locate(axis, offset) {
      Some(interval) => lerp_round(interval.range(axis), interval.range(axis.flip()), offset),
      None => 0,
    }
  }
}

fn ordered(a: usize, b: usize) -> Range<usize> {
  if a <= b { a..b } else { b..a }
}
