//! View configuration: TOML file loading and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. Explicit path passed by the caller
//! 2. `$PATHVIEW_CONFIG` environment variable (path to config file)
//! 3. Project-local `.pathview.toml` in the current working directory
//! 4. Global `~/.config/pathview/config.toml`
//! 5. Built-in defaults
//!
//! Only view behavior is configurable here; persistence of tree content or
//! per-node display state is the embedding application's concern.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::store::SortMode;

/// View settings section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewSection {
    /// Sort order: "insertion", "name", "folders_first".
    pub sort_by: Option<String>,
    /// Jump to and select the sole match of a narrowing filter.
    pub auto_focus_single_match: Option<bool>,
}

/// Top-level view configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (explicit file overrides candidates, candidates
/// override defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewConfig {
    pub view: ViewSection,
}

/// Return the list of candidate config file paths in priority order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. $PATHVIEW_CONFIG environment variable
    if let Ok(env_path) = std::env::var("PATHVIEW_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. Project-local `.pathview.toml` in CWD
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".pathview.toml"));
    }

    // 3. Global `~/.config/pathview/config.toml`
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("pathview").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<ViewConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ViewConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

impl ViewConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &ViewConfig) -> ViewConfig {
        ViewConfig {
            view: ViewSection {
                sort_by: other.view.sort_by.clone().or(self.view.sort_by),
                auto_focus_single_match: other
                    .view
                    .auto_focus_single_match
                    .or(self.view.auto_focus_single_match),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `explicit_path` takes priority over every candidate location.
    pub fn load(explicit_path: Option<&Path>) -> ViewConfig {
        let mut config = ViewConfig::default();

        // Walk candidates in reverse so the highest-priority one overwrites.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(path) = explicit_path {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────

    /// Sibling sort order (folders first by default).
    pub fn sort(&self) -> SortMode {
        self.view
            .sort_by
            .as_deref()
            .map(SortMode::from_str)
            .unwrap_or_default()
    }

    /// Whether single-match auto-focus is enabled (on by default).
    pub fn auto_focus_single_match(&self) -> bool {
        self.view.auto_focus_single_match.unwrap_or(true)
    }
}
