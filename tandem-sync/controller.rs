//! The cursor sync controller.
//!
//! Orchestrates which mapping answers a cursor movement, which direction the
//! movement flows, and what the opposite pane does about it. Sync direction
//! is gated on focus: only the pane the user is actually working in emits
//! qualifying movements, so the reveal we trigger in the opposite pane can
//! never be mistaken for user input and bounce back.

use std::ops::Range;

use tandem_core::{
  AnchorTable,
  Interval,
  IntervalMap,
};
use tracing::trace;

use crate::{
  config::SyncConfig,
  pane::{
    Pane,
    PaneKind,
  },
};

/// Which pane, if any, currently owns keyboard focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
  #[default]
  None,
  Source,
  Derived,
}

impl From<PaneKind> for Focus {
  fn from(pane: PaneKind) -> Focus {
    match pane {
      PaneKind::Source => Focus::Source,
      PaneKind::Derived => Focus::Derived,
    }
  }
}

/// The mapping behind the currently visible derived view.
///
/// Freeform reformatted text has no discrete node boundaries, so it is
/// correlated through the diff-based anchor table. A structural dump's
/// correspondence to source is already exact and interval-shaped, so it uses
/// the engine-supplied intervals directly; diffing dump text against source
/// text would correlate two unrelated grammars.
#[derive(Debug)]
pub enum ViewMapping {
  Reflow(AnchorTable),
  Structure(IntervalMap),
}

impl ViewMapping {
  pub fn is_empty(&self) -> bool {
    match self {
      ViewMapping::Reflow(table) => table.is_empty(),
      ViewMapping::Structure(map) => map.is_empty(),
    }
  }

  pub fn src_to_out(&self, offset: usize) -> usize {
    match self {
      ViewMapping::Reflow(table) => table.src_to_out(offset),
      ViewMapping::Structure(map) => map.src_to_out(offset),
    }
  }

  pub fn out_to_src(&self, offset: usize) -> usize {
    match self {
      ViewMapping::Reflow(table) => table.out_to_src(offset),
      ViewMapping::Structure(map) => map.out_to_src(offset),
    }
  }

  pub fn map_range_src_to_out(&self, range: Range<usize>) -> Range<usize> {
    match self {
      ViewMapping::Reflow(table) => table.map_range_src_to_out(range),
      ViewMapping::Structure(map) => map.map_range_src_to_out(range),
    }
  }

  pub fn map_range_out_to_src(&self, range: Range<usize>) -> Range<usize> {
    match self {
      ViewMapping::Reflow(table) => table.map_range_out_to_src(range),
      ViewMapping::Structure(map) => map.map_range_out_to_src(range),
    }
  }
}

/// What a completed sync did, for hosts that log or test the behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
  /// Offset revealed in the opposite pane.
  pub target: usize,
  /// The moved pane's selection projected into the opposite pane, when a
  /// non-empty selection drove the sync.
  pub mapped_selection: Option<Range<usize>>,
  /// Whether interval highlights were (re)painted.
  pub highlighted: bool,
}

/// Focus-gated orchestrator between two panes and the active mapping.
///
/// The controller holds no references to the panes; the host passes both
/// widgets into each event call, which keeps widget ownership entirely on
/// the host's side and the controller trivially droppable. Mappings are
/// replaced wholesale via [`SyncController::set_mapping`] whenever either
/// text changes; the controller never carries one across a text change.
#[derive(Debug, Default)]
pub struct SyncController {
  config: SyncConfig,
  focus: Focus,
  mapping: Option<ViewMapping>,
  decorated: bool,
}

impl SyncController {
  pub fn new(config: SyncConfig) -> SyncController {
    SyncController {
      config,
      ..SyncController::default()
    }
  }

  pub fn config(&self) -> &SyncConfig {
    &self.config
  }

  pub fn focus(&self) -> Focus {
    self.focus
  }

  pub fn mapping(&self) -> Option<&ViewMapping> {
    self.mapping.as_ref()
  }

  /// A pane gained keyboard focus.
  pub fn focus_gained(&mut self, pane: PaneKind) {
    self.focus = pane.into();
  }

  /// A pane lost keyboard focus. Ignored unless that pane was the focused
  /// one, so a blur arriving after the opposite pane's focus event does not
  /// knock out the newer state.
  pub fn focus_lost(&mut self, pane: PaneKind) {
    if self.focus == pane.into() {
      self.focus = Focus::None;
    }
  }

  /// Install the mapping for the currently visible derived view, or `None`
  /// while no mapping is available. Stale decorations never outlive the
  /// mapping they were computed from.
  pub fn set_mapping(
    &mut self,
    mapping: Option<ViewMapping>,
    source: &mut dyn Pane,
    derived: &mut dyn Pane,
  ) {
    self.clear_decorations(source, derived);
    self.mapping = mapping;
  }

  /// Replace the configuration, clearing decorations when the new settings
  /// no longer allow them.
  pub fn set_config(&mut self, config: SyncConfig, source: &mut dyn Pane, derived: &mut dyn Pane) {
    let clear = !config.cursor_sync || !config.highlights;
    self.config = config;
    if clear {
      self.clear_decorations(source, derived);
    }
  }

  /// Toggle the master switch, clearing decorations when turning off.
  pub fn set_enabled(&mut self, enabled: bool, source: &mut dyn Pane, derived: &mut dyn Pane) {
    let mut config = self.config.clone();
    config.cursor_sync = enabled;
    self.set_config(config, source, derived);
  }

  /// Tear down: drop the mapping, forget focus, remove decorations.
  pub fn detach(&mut self, source: &mut dyn Pane, derived: &mut dyn Pane) {
    self.clear_decorations(source, derived);
    self.mapping = None;
    self.focus = Focus::None;
  }

  /// The cursor moved in `moved`. Syncs the opposite pane when the movement
  /// qualifies; returns `None` when it does not (sync disabled, pane not
  /// focused, or no usable mapping; the latter means "temporarily
  /// unavailable", not an error).
  pub fn cursor_moved(
    &mut self,
    moved: PaneKind,
    source: &mut dyn Pane,
    derived: &mut dyn Pane,
  ) -> Option<SyncOutcome> {
    if !self.config.cursor_sync {
      return None;
    }
    if self.focus != moved.into() {
      // Movements in the unfocused pane are echoes of our own reveal calls
      // or programmatic edits; syncing them would loop.
      return None;
    }

    let (selection, cursor) = match moved {
      PaneKind::Source => (source.selection(), source.cursor()),
      PaneKind::Derived => (derived.selection(), derived.cursor()),
    };
    let selection = selection.filter(|range| !range.is_empty());
    let offset = match &selection {
      Some(range) => range.start,
      None => cursor?,
    };

    let mapping = match &self.mapping {
      Some(mapping) if !mapping.is_empty() => mapping,
      _ => {
        trace!(?moved, offset, "cursor sync skipped: no usable mapping");
        return None;
      },
    };

    let mapped_selection = selection.map(|range| match moved {
      PaneKind::Source => mapping.map_range_src_to_out(range),
      PaneKind::Derived => mapping.map_range_out_to_src(range),
    });
    let target = match &mapped_selection {
      Some(range) => range.start,
      None => match moved {
        PaneKind::Source => mapping.src_to_out(offset),
        PaneKind::Derived => mapping.out_to_src(offset),
      },
    };

    // Decorations are computed up front so the mapping borrow ends before
    // the panes are touched.
    let mut decorations = None;
    if self.config.highlights {
      if let ViewMapping::Structure(map) = mapping {
        let matched = match moved {
          PaneKind::Source => map.find_at_src(offset),
          PaneKind::Derived => map.find_at_out(offset),
        };
        if let Some(matched) = matched {
          let mirrored: Vec<Range<usize>> = map.same_source(matched).map(Interval::out).collect();
          decorations = Some((matched.src(), mirrored));
        }
      }
    }

    trace!(?moved, offset, target, "cursor sync");

    match moved {
      PaneKind::Source => derived.reveal(target),
      PaneKind::Derived => source.reveal(target),
    }

    let highlighted = decorations.is_some();
    if let Some((src_range, mirrored)) = decorations {
      source.set_highlights(&[src_range]);
      derived.set_highlights(&mirrored);
      self.decorated = true;
    }

    Some(SyncOutcome {
      target,
      mapped_selection,
      highlighted,
    })
  }

  fn clear_decorations(&mut self, source: &mut dyn Pane, derived: &mut dyn Pane) {
    if self.decorated {
      source.clear_highlights();
      derived.clear_highlights();
      self.decorated = false;
    }
  }
}

#[cfg(test)]
mod tests {
  use tandem_core::{
    AnchorTable,
    Interval,
    IntervalMap,
  };

  use super::*;

  #[derive(Default)]
  struct FakePane {
    cursor: Option<usize>,
    selection: Option<Range<usize>>,
    revealed: Vec<usize>,
    highlights: Option<Vec<Range<usize>>>,
    clears: usize,
  }

  impl Pane for FakePane {
    fn cursor(&self) -> Option<usize> {
      self.cursor
    }

    fn selection(&self) -> Option<Range<usize>> {
      self.selection.clone()
    }

    fn reveal(&mut self, offset: usize) {
      self.revealed.push(offset);
    }

    fn set_highlights(&mut self, ranges: &[Range<usize>]) {
      self.highlights = Some(ranges.to_vec());
    }

    fn clear_highlights(&mut self) {
      self.highlights = None;
      self.clears += 1;
    }
  }

  fn reflow_mapping() -> ViewMapping {
    // Anchors: f(0,0) ((1,1) a(2,2) ,(3,3) b(4,5) )(5,6)
    ViewMapping::Reflow(AnchorTable::build("f(a,b)", "f(a, b)"))
  }

  fn structure_mapping() -> ViewMapping {
    ViewMapping::Structure(
      IntervalMap::new(vec![
        Interval::new(0..4, 10..18),
        Interval::new(5..8, 24..30),
        Interval::new(5..8, 44..50),
      ])
      .unwrap(),
    )
  }

  fn controller_with(mapping: ViewMapping) -> (SyncController, FakePane, FakePane) {
    let mut controller = SyncController::new(SyncConfig::default());
    let mut source = FakePane::default();
    let mut derived = FakePane::default();
    controller.set_mapping(Some(mapping), &mut source, &mut derived);
    (controller, source, derived)
  }

  #[test]
  fn unfocused_movement_does_not_sync() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    source.cursor = Some(4);

    let outcome = controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);
    assert!(outcome.is_none());
    assert!(derived.revealed.is_empty());
  }

  #[test]
  fn focused_source_movement_reveals_in_derived() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(4);

    let outcome = controller
      .cursor_moved(PaneKind::Source, &mut source, &mut derived)
      .unwrap();
    assert_eq!(outcome.target, 5);
    assert!(!outcome.highlighted);
    assert_eq!(derived.revealed, vec![5]);
    assert!(source.revealed.is_empty());
  }

  #[test]
  fn focused_derived_movement_syncs_back_to_source() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    controller.focus_gained(PaneKind::Derived);
    derived.cursor = Some(6);

    let outcome = controller
      .cursor_moved(PaneKind::Derived, &mut source, &mut derived)
      .unwrap();
    assert_eq!(outcome.target, 5);
    assert_eq!(source.revealed, vec![5]);
  }

  #[test]
  fn reveals_in_one_pane_cannot_bounce_back() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(4);
    controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);

    // The reveal moved the derived pane's cursor; the resulting event must
    // not sync back while focus stays on the source pane.
    derived.cursor = Some(5);
    let echo = controller.cursor_moved(PaneKind::Derived, &mut source, &mut derived);
    assert!(echo.is_none());
    assert!(source.revealed.is_empty());
  }

  #[test]
  fn blur_of_the_other_pane_keeps_focus() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    controller.focus_gained(PaneKind::Source);
    controller.focus_lost(PaneKind::Derived);
    assert_eq!(controller.focus(), Focus::Source);

    controller.focus_lost(PaneKind::Source);
    assert_eq!(controller.focus(), Focus::None);
  }

  #[test]
  fn structure_mapping_highlights_both_panes() {
    let (mut controller, mut source, mut derived) = controller_with(structure_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(6);

    let outcome = controller
      .cursor_moved(PaneKind::Source, &mut source, &mut derived)
      .unwrap();
    assert!(outcome.highlighted);
    assert_eq!(source.highlights, Some(vec![5..8]));
    // Both output fragments of the shared source range light up.
    assert_eq!(derived.highlights, Some(vec![24..30, 44..50]));
  }

  #[test]
  fn reverse_structure_lookup_highlights_the_matched_group() {
    let (mut controller, mut source, mut derived) = controller_with(structure_mapping());
    controller.focus_gained(PaneKind::Derived);
    derived.cursor = Some(26);

    let outcome = controller
      .cursor_moved(PaneKind::Derived, &mut source, &mut derived)
      .unwrap();
    assert_eq!(outcome.target, 6);
    assert_eq!(source.highlights, Some(vec![5..8]));
    assert_eq!(derived.highlights, Some(vec![24..30, 44..50]));
  }

  #[test]
  fn selection_sync_maps_the_whole_range() {
    let (mut controller, mut source, mut derived) = controller_with(reflow_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(2);
    source.selection = Some(2..5);

    let outcome = controller
      .cursor_moved(PaneKind::Source, &mut source, &mut derived)
      .unwrap();
    assert_eq!(outcome.mapped_selection, Some(2..6));
    assert_eq!(derived.revealed, vec![2]);
  }

  #[test]
  fn missing_mapping_skips_quietly() {
    let mut controller = SyncController::new(SyncConfig::default());
    let mut source = FakePane::default();
    let mut derived = FakePane::default();
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(3);

    assert!(
      controller
        .cursor_moved(PaneKind::Source, &mut source, &mut derived)
        .is_none()
    );
    assert!(derived.revealed.is_empty());

    // An installed-but-empty mapping is equally unusable.
    controller.set_mapping(
      Some(ViewMapping::Reflow(AnchorTable::default())),
      &mut source,
      &mut derived,
    );
    assert!(
      controller
        .cursor_moved(PaneKind::Source, &mut source, &mut derived)
        .is_none()
    );
  }

  #[test]
  fn disabling_sync_clears_decorations() {
    let (mut controller, mut source, mut derived) = controller_with(structure_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(6);
    controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);
    assert!(source.highlights.is_some());

    controller.set_enabled(false, &mut source, &mut derived);
    assert!(source.highlights.is_none());
    assert!(derived.highlights.is_none());

    // And movements no longer sync at all.
    let outcome = controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);
    assert!(outcome.is_none());
  }

  #[test]
  fn replacing_the_mapping_clears_stale_decorations() {
    let (mut controller, mut source, mut derived) = controller_with(structure_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(6);
    controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);
    assert!(derived.highlights.is_some());

    controller.set_mapping(Some(reflow_mapping()), &mut source, &mut derived);
    assert!(source.highlights.is_none());
    assert!(derived.highlights.is_none());
  }

  #[test]
  fn detach_resets_everything() {
    let (mut controller, mut source, mut derived) = controller_with(structure_mapping());
    controller.focus_gained(PaneKind::Source);
    source.cursor = Some(6);
    controller.cursor_moved(PaneKind::Source, &mut source, &mut derived);

    controller.detach(&mut source, &mut derived);
    assert!(source.highlights.is_none());
    assert!(controller.mapping().is_none());
    assert_eq!(controller.focus(), Focus::None);
  }
}
