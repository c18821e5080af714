//! Diff-based offset correlation against freeform reformatted text.
//!
//! A reformatter mostly shuffles whitespace, so both texts are reduced to
//! their non-whitespace character streams before diffing. Every character the
//! edit script reports as equal yields one [`Anchor`] pairing the original
//! byte offsets on both sides; inserted and deleted characters yield nothing.
//! Queries between anchors interpolate linearly.

use std::{
  ops::Range,
  time::Instant,
};

use imara_diff::{
  Algorithm,
  Diff,
  InternedInput,
};

use crate::lookup::{
  Axis,
  lerp_round,
};

/// A confirmed one-to-one character correspondence between a source byte
/// offset and a derived-text byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
  pub src: usize,
  pub out: usize,
}

impl Anchor {
  fn coord(&self, axis: Axis) -> usize {
    match axis {
      Axis::Src => self.src,
      Axis::Out => self.out,
    }
  }
}

/// Ordered table of [`Anchor`]s, non-decreasing on both coordinates.
///
/// Holds confirmed correspondences only; characters the reformatter inserted
/// or removed are absent and get interpolated over at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorTable {
  anchors: Vec<Anchor>,
}

/// Extract non-whitespace code points with their original byte offsets.
///
/// Iterates per code point, so multi-byte scalars are never split. The
/// whitespace set is exactly what reformatters shuffle: space, tab, LF, CR.
fn significant_chars(text: &str) -> Vec<(usize, char)> {
  text
    .char_indices()
    .filter(|&(_, ch)| !matches!(ch, ' ' | '\t' | '\n' | '\r'))
    .collect()
}

impl AnchorTable {
  /// Build the correspondence table between `source` and its reformatted
  /// rendition `derived`.
  ///
  /// Returns an empty table when either input is empty or all-whitespace.
  ///
  /// The correlation is a heuristic: filtering whitespace lets the edit
  /// script concentrate on genuine content movement, but large-scale token
  /// reordering (e.g. an option that re-sorts import items) can still match
  /// equal characters across unrelated tokens and produce locally plausible,
  /// semantically wrong anchors.
  pub fn build(source: &str, derived: &str) -> AnchorTable {
    if source.is_empty() || derived.is_empty() {
      return AnchorTable::default();
    }

    let src_chars = significant_chars(source);
    let out_chars = significant_chars(derived);
    if src_chars.is_empty() || out_chars.is_empty() {
      return AnchorTable::default();
    }

    let start = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);

    let mut input = InternedInput::default();
    input.update_before(src_chars.iter().map(|&(_, ch)| ch));
    input.update_after(out_chars.iter().map(|&(_, ch)| ch));

    // The histogram heuristic does not work as well for characters because
    // the same characters often reoccur; use Myers instead.
    let mut diff = Diff::default();
    diff.compute_with(
      Algorithm::Myers,
      &input.before,
      &input.after,
      input.interner.num_tokens(),
    );

    let mut anchors = Vec::with_capacity(src_chars.len().min(out_chars.len()));
    let mut src_idx = 0;
    let mut out_idx = 0;
    let mut push_equal_run = |len: usize, src_idx: &mut usize, out_idx: &mut usize| {
      for _ in 0..len {
        anchors.push(Anchor {
          src: src_chars[*src_idx].0,
          out: out_chars[*out_idx].0,
        });
        *src_idx += 1;
        *out_idx += 1;
      }
    };

    for hunk in diff.hunks() {
      let equal = hunk.before.start as usize - src_idx;
      debug_assert_eq!(equal, hunk.after.start as usize - out_idx);
      push_equal_run(equal, &mut src_idx, &mut out_idx);
      src_idx = hunk.before.end as usize;
      out_idx = hunk.after.end as usize;
    }
    debug_assert_eq!(src_chars.len() - src_idx, out_chars.len() - out_idx);
    push_equal_run(src_chars.len() - src_idx, &mut src_idx, &mut out_idx);

    if let Some(start) = start {
      tracing::debug!(
        "anchor build took {}s for {} anchors",
        Instant::now().duration_since(start).as_secs_f64(),
        anchors.len()
      );
    }

    AnchorTable { anchors }
  }

  /// Wrap an existing anchor list, e.g. one restored by the host.
  ///
  /// `anchors` must be non-decreasing on both coordinates, as produced by
  /// [`AnchorTable::build`].
  pub fn from_anchors(anchors: Vec<Anchor>) -> AnchorTable {
    debug_assert!(anchors.windows(2).all(|w| w[0].src <= w[1].src && w[0].out <= w[1].out));
    AnchorTable { anchors }
  }

  pub fn anchors(&self) -> &[Anchor] {
    &self.anchors
  }

  pub fn len(&self) -> usize {
    self.anchors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.anchors.is_empty()
  }

  /// Map a source offset to the corresponding derived-text offset.
  pub fn src_to_out(&self, offset: usize) -> usize {
    self.project(Axis::Src, offset)
  }

  /// Map a derived-text offset back to the corresponding source offset.
  pub fn out_to_src(&self, offset: usize) -> usize {
    self.project(Axis::Out, offset)
  }

  /// Map a source range to the derived text, endpoint by endpoint.
  pub fn map_range_src_to_out(&self, range: Range<usize>) -> Range<usize> {
    ordered(self.src_to_out(range.start), self.src_to_out(range.end))
  }

  /// Map a derived-text range back to the source, endpoint by endpoint.
  pub fn map_range_out_to_src(&self, range: Range<usize>) -> Range<usize> {
    ordered(self.out_to_src(range.start), self.out_to_src(range.end))
  }

  fn project(&self, axis: Axis, offset: usize) -> usize {
    let (first, last) = match (self.anchors.first(), self.anchors.last()) {
      (Some(first), Some(last)) => (first, last),
      _ => return 0,
    };

    if offset <= first.coord(axis) {
      return first.coord(axis.flip());
    }
    if offset >= last.coord(axis) {
      return last.coord(axis.flip());
    }

    // Bracketing anchor pair around the query on the searched axis. The
    // clamps above guarantee both sides exist.
    let hi = self.anchors.partition_point(|a| a.coord(axis) <= offset);
    let a = &self.anchors[hi - 1];
    let b = &self.anchors[hi];

    if a.coord(axis) == offset {
      return a.coord(axis.flip());
    }
    lerp_round(
      a.coord(axis)..b.coord(axis),
      a.coord(axis.flip())..b.coord(axis.flip()),
      offset,
    )
  }
}

fn ordered(a: usize, b: usize) -> Range<usize> {
  if a <= b { a..b } else { b..a }
}
