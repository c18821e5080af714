//! The seam between the sync controller and the host's editor widgets.

use std::ops::Range;

/// Identifies one of the two panes the controller coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
  /// The pane holding the raw source text.
  Source,
  /// The pane holding the derived view (reformatted text or a dump).
  Derived,
}

/// What the controller needs from an editor widget.
///
/// Offsets use the same units as the texts the active mapping was built
/// from. Implementations are expected to be cheap; every method is called on
/// the UI thread in direct response to an input event.
pub trait Pane {
  /// Current cursor position, if the widget has one.
  fn cursor(&self) -> Option<usize>;

  /// Current selection. `None` when there is no selection or it is empty;
  /// a non-empty selection takes precedence over the bare cursor when
  /// syncing.
  fn selection(&self) -> Option<Range<usize>> {
    None
  }

  /// Scroll so the line containing `offset` is centered in the viewport.
  fn reveal(&mut self, offset: usize);

  /// Replace this controller's highlight decorations with `ranges`.
  fn set_highlights(&mut self, ranges: &[Range<usize>]);

  /// Remove every highlight decoration this controller applied.
  fn clear_highlights(&mut self);
}
