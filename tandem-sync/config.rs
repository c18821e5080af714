//! Cursor-sync configuration, as persisted by the host.

use serde::{
  Deserialize,
  Serialize,
};

/// Behaviour toggles for the sync controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncConfig {
  /// Master switch. When off, cursor movement never crosses panes and any
  /// highlights are removed.
  pub cursor_sync: bool,
  /// Paint interval highlights while a structural view is active.
  pub highlights: bool,
}

impl Default for SyncConfig {
  fn default() -> Self {
    SyncConfig {
      cursor_sync: true,
      highlights: true,
    }
  }
}

impl SyncConfig {
  /// Parse from the host's TOML settings, falling back to defaults for
  /// absent keys.
  pub fn from_toml(raw: &str) -> Result<SyncConfig, toml::de::Error> {
    toml::from_str(raw)
  }
}
