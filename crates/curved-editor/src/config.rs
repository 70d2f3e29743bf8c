//! Editor configuration.
//!
//! Tolerances are expressed in screen pixels; the presenter converts them to
//! curve space per axis when a drag starts.

use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

/// Pixel tolerances for pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenTolerances {
    /// Distance the pointer must travel before a press becomes a drag.
    /// Default: **4 px**.
    pub drag_padding: f64,

    /// Half-size of the box used to hit points, handles and curves.
    /// Default: **6 px**.
    pub hit_padding: f64,

    /// On-screen length of a rendered tangent handle. Default: **40 px**.
    pub tangent_length: f64,
}

impl Default for ScreenTolerances {
    fn default() -> Self {
        Self {
            drag_padding: 4.0,
            hit_padding: 6.0,
            tangent_length: 40.0,
        }
    }
}

/// Top-level configuration for a curve editor instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub tolerances: ScreenTolerances,

    /// Maximum number of undo steps kept by `UndoStack`. Default: **100**.
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tolerances: ScreenTolerances::default(),
            undo_depth: 100,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config; missing fields fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
