//! Focus-gated cursor synchronization between a source pane and a derived
//! view pane.
//!
//! The controller in this crate sits between two editor widgets and the
//! offset mappings from `tandem-core`. It tracks which pane owns focus,
//! reacts to cursor movement in that pane only, and drives scroll-reveal and
//! highlight side effects in the opposite pane through the [`Pane`] seam.
//! Widgets, rendering, and event plumbing stay on the host's side of that
//! seam.

pub mod config;
pub mod controller;
pub mod pane;

pub use config::SyncConfig;
pub use controller::{
  Focus,
  SyncController,
  SyncOutcome,
  ViewMapping,
};
pub use pane::{
  Pane,
  PaneKind,
};
