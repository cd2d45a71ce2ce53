//! Patch orchestration: read, rewrite, guard, back up, write, report.
//!
//! Per file the pipeline is: read original text, run the pattern rewrites,
//! run the dedupe injector on their output, and only when the cumulative
//! change count is nonzero and the final text actually differs, back up the
//! original and overwrite the file. The backup is written at most once per
//! file over its lifetime; it is the ground truth of "original".
//!
//! Failure policy is asymmetric on purpose: an unreadable file during
//! discovery is skipped, but once a candidate is selected, any read or
//! write failure aborts the whole run.

use crate::dedupe::ensure_dedupe;
use crate::rewrite::rewrite;
use crate::safety::{EngineGuard, SafetyError};
use crate::scan::find_candidates;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed subdirectory of the project root holding the engine sources.
pub const ENGINE_SRC: &str = "engine/src";

/// Suffix appended to a patched file's full name for its pre-patch
/// snapshot (`view.ts` -> `view.ts.bak_omni_fog`).
pub const BACKUP_SUFFIX: &str = ".bak_omni_fog";

/// Options for a patch run.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Run the full pipeline but write neither backups nor patched files.
    pub dry_run: bool,
}

/// Result of patching a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries the report data for this file"]
pub struct PatchOutcome {
    /// The patched file, as discovered under the engine source tree
    pub file: PathBuf,
    /// Summed change count across all stages
    pub changes: usize,
    /// Text before patching
    pub original: String,
    /// Text after patching
    pub patched: String,
}

/// Errors terminating a patch run.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{} not found; run against the repository root", .0.display())]
    EngineSrcMissing(PathBuf),

    #[error(
        "could not find a file under {} containing both 'visibleCells' and 'face'",
        .engine_src.display()
    )]
    NoCandidates { engine_src: PathBuf },

    #[error(
        "found {candidates} candidate file(s), but no known forward-only visibility pattern matched"
    )]
    NoPatternMatched { candidates: usize },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

impl PatchError {
    /// Whether this is one of the three diagnosed abort conditions
    /// (missing engine tree, empty scan, nothing matched) that map to
    /// exit code 2.
    pub fn is_diagnosed(&self) -> bool {
        matches!(
            self,
            PatchError::EngineSrcMissing(_)
                | PatchError::NoCandidates { .. }
                | PatchError::NoPatternMatched { .. }
        )
    }
}

/// Patch every candidate file under `<root>/engine/src`.
///
/// Returns one outcome per file actually modified, in scan order. The
/// three fatal conditions are distinguished by [`PatchError`] variant; a
/// run that modifies nothing is a failure, not an empty success.
pub fn run(root: &Path, options: &ApplyOptions) -> Result<Vec<PatchOutcome>, PatchError> {
    let engine_src = root.join(ENGINE_SRC);
    if !engine_src.is_dir() {
        return Err(PatchError::EngineSrcMissing(engine_src));
    }

    let candidates = find_candidates(&engine_src);
    if candidates.is_empty() {
        return Err(PatchError::NoCandidates { engine_src });
    }

    let guard = EngineGuard::new(root)?;
    let total = candidates.len();
    let mut outcomes = Vec::new();

    for path in candidates {
        let original = read_text(&path)?;

        let (text, rewrites) = rewrite(&original);
        let (text, deduped) = ensure_dedupe(&text);
        let changes = rewrites + deduped;

        if changes == 0 || text == original {
            continue;
        }

        if !options.dry_run {
            let canonical = guard.validate_path(&path)?;
            write_backup(&canonical, &original)?;
            atomic_write(&canonical, text.as_bytes())?;
            refresh_mtime(&canonical)?;
        }

        outcomes.push(PatchOutcome {
            file: path,
            changes,
            original,
            patched: text,
        });
    }

    if outcomes.is_empty() {
        return Err(PatchError::NoPatternMatched { candidates: total });
    }

    Ok(outcomes)
}

/// Backup path for a source file: the fixed suffix appended to the full
/// filename, so backups never collide with candidate discovery.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn io_err(path: &Path, source: std::io::Error) -> PatchError {
    PatchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_text(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|e| io_err(path, e))
}

fn write_backup(path: &Path, original: &str) -> Result<(), PatchError> {
    let backup = backup_path(path);
    // An existing backup is the first-ever pre-patch snapshot; later runs
    // must never replace it.
    if backup.exists() {
        return Ok(());
    }
    atomic_write(&backup, original.as_bytes())
}

/// Atomic file write: tempfile in the target directory + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PatchError> {
    let parent = path.parent().ok_or_else(|| {
        io_err(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent directory"),
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| io_err(path, e))?;
    temp.write_all(content).map_err(|e| io_err(path, e))?;
    temp.as_file().sync_all().map_err(|e| io_err(path, e))?;
    temp.persist(path).map_err(|e| io_err(path, e.error))?;

    Ok(())
}

/// Refresh mtime so watchers and incremental builds pick up the change.
fn refresh_mtime(path: &Path) -> Result<(), PatchError> {
    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(|e| io_err(path, e))
}
