//! Candidate discovery: which engine sources plausibly build visibility.
//!
//! Selection is a two-substring heuristic, not a parse: a file that both
//! declares the visible-cell collection and mentions the player's facing
//! direction is a strong signal for a forward-only visibility trace.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker naming the visibility-cell collection.
pub const VISIBLE_CELLS_SIGNAL: &str = "visibleCells";

/// Marker referencing the actor's facing direction (covers `player.face`).
pub const FACING_SIGNAL: &str = "face";

/// Recursively collect `.ts` files under `engine_src` containing both
/// signal substrings.
///
/// Discovery is best-effort: files that cannot be read (permissions, broken
/// symlinks, non-UTF-8 content) are silently excluded rather than aborting
/// the scan. The result is sorted so downstream reports are deterministic.
pub fn find_candidates(engine_src: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();

    for entry in WalkDir::new(engine_src).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|s| s.to_str()) != Some("ts") {
            continue;
        }

        let Ok(text) = fs::read_to_string(entry.path()) else {
            continue;
        };

        if text.contains(VISIBLE_CELLS_SIGNAL) && text.contains(FACING_SIGNAL) {
            out.push(entry.path().to_path_buf());
        }
    }

    out.sort();
    out
}
