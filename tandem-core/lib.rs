//! Offset correlation between a source text and its derived views.
//!
//! A host editor shows the raw source in one pane and a derived rendition of
//! it (reformatted output, a structural dump) in another. The derived text is
//! not byte-for-byte aligned with the source, so keeping cursors and
//! highlights in step across panes needs a position correspondence between
//! the two strings. This crate provides the two correspondence structures and
//! their query paths:
//!
//! - [`AnchorTable`] correlates source text with freeform reformatted text by
//!   diffing the non-whitespace character streams of both sides. Every
//!   matched character becomes an [`Anchor`]; positions between anchors are
//!   estimated by linear interpolation.
//! - [`IntervalMap`] correlates source text with a structural dump through
//!   range correspondences supplied by the external formatting engine. The
//!   map answers containment lookups on either side and keeps a lazily built
//!   index for output-side queries.
//!
//! All query paths are total: out-of-range offsets clamp to the nearest known
//! correspondence, empty mappings answer `0`, and nothing panics. The only
//! fallible operation is [`IntervalMap::new`], which rejects interval lists
//! that violate the supplier's ordering contract.
//!
//! Everything here is synchronous and allocation happens only at build time;
//! per-query work is a binary search. Rebuilds replace a table or map
//! wholesale, so callers never observe a half-updated mapping.

pub mod anchor;
pub mod interval;
mod lookup;

pub use anchor::{
  Anchor,
  AnchorTable,
};
pub use interval::{
  Interval,
  IntervalMap,
  IntervalMapError,
};
