//! Omnifog Patcher: pattern-based fog-of-war visibility patching
//!
//! Rewrites a TypeScript dungeon-crawler engine's forward-only visibility
//! trace into an omni-directional one, using fixed structural patterns with
//! named capture groups. No parse tree is built; matching is purely textual.
//!
//! # Architecture
//!
//! Each rewrite stage is a pure function from text to `(text, change count)`.
//! The orchestrator in [`apply`] chains the stages per file and owns the
//! backup and write policy. Intelligence lives in the patterns, not in the
//! application logic.
//!
//! # Safety
//!
//! - First-write backups: the pre-patch snapshot is written once and never
//!   overwritten on later runs
//! - Atomic file writes (tempfile + fsync + rename)
//! - Project boundary enforcement (no writes into `node_modules` or `.git`,
//!   symlink escapes rejected)
//! - Idempotent stages: a patched file yields zero changes on a re-run
//! - Bounded edit radius: at most the first 10 append sites are guarded
//!
//! # Known limitation
//!
//! The forward-block transform applies to the first eligible region of a
//! file only. Files with several independent forward-only traversal blocks
//! keep all but the first unchanged.

pub mod apply;
pub mod cache;
pub mod dedupe;
pub mod rewrite;
pub mod safety;
pub mod scan;

// Re-exports
pub use apply::{backup_path, run, ApplyOptions, PatchError, PatchOutcome, BACKUP_SUFFIX, ENGINE_SRC};
pub use dedupe::ensure_dedupe;
pub use rewrite::{rewrite, rewrite_dirs_literal, rewrite_forward_block, OMNI_DIRS_DECL};
pub use safety::{EngineGuard, SafetyError};
pub use scan::{find_candidates, FACING_SIGNAL, VISIBLE_CELLS_SIGNAL};
