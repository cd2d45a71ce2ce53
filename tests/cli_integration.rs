//! Integration tests for the CLI
//!
//! Drives the built binary against synthesized game repositories and
//! checks the report output and the exit-code contract.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const VIEW_TS: &str = "\
export function view(player: Player): Cell[] {
  const visibleCells = [];

  const dir = player.face;
  for (let i = 1; i <= 3; i++) {
    const cell = castRay(player, dir, i);
    visibleCells.push(cell);
  }
  return visibleCells;
}
";

/// Helper to create a game repository with one forward-only view file
fn setup_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("engine/src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("view.ts"), VIEW_TS).unwrap();
    dir
}

fn patcher(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_omnifog-patcher"))
        .args(args)
        .output()
        .expect("failed to run omnifog-patcher")
}

fn view_path(root: &Path) -> PathBuf {
    root.join("engine/src/view.ts")
}

fn backup_of(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak_omni_fog");
    PathBuf::from(name)
}

#[test]
fn apply_patches_and_reports() {
    let repo = setup_repo();
    let root = repo.path().to_str().unwrap();

    let output = patcher(&["apply", "--root", root]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("OK: omni-direction fog patch applied:"));
    assert!(stdout.contains("- patched engine/src/view.ts (changes=2)"));

    let patched = fs::read_to_string(view_path(repo.path())).unwrap();
    assert!(patched.contains("const dirs = ['N','E','S','W'] as const;"));
    assert!(patched.contains("for (const face of dirs) {"));
    assert!(patched.contains("const seen = new Set<string>();"));

    let backup = backup_of(&view_path(repo.path()));
    assert_eq!(fs::read_to_string(backup).unwrap(), VIEW_TS);
}

#[test]
fn missing_engine_src_exits_2() {
    let dir = TempDir::new().unwrap();

    let output = patcher(&["apply", "--root", dir.path().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("not found"));
    // Nothing was created anywhere under the root.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn no_candidates_exits_2() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("engine/src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("map.ts"), "export const tiles = [];\n").unwrap();

    let output = patcher(&["apply", "--root", dir.path().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("visibleCells"));
}

#[test]
fn unmatched_pattern_exits_2() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("engine/src");
    fs::create_dir_all(&src).unwrap();
    let content = "const visibleCells = getCells();\nconst f = player.face;\n";
    fs::write(src.join("view.ts"), content).unwrap();

    let output = patcher(&["apply", "--root", dir.path().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("no known forward-only visibility pattern matched"));

    // Candidate left byte-for-byte alone, no backup written.
    assert_eq!(fs::read_to_string(src.join("view.ts")).unwrap(), content);
    assert!(!backup_of(&src.join("view.ts")).exists());
}

#[test]
fn dry_run_modifies_nothing() {
    let repo = setup_repo();

    let output = patcher(&["apply", "--root", repo.path().to_str().unwrap(), "--dry-run"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("- would patch engine/src/view.ts (changes=2)"));

    assert_eq!(fs::read_to_string(view_path(repo.path())).unwrap(), VIEW_TS);
    assert!(!backup_of(&view_path(repo.path())).exists());
}

#[test]
fn diff_flag_shows_unified_diff() {
    let repo = setup_repo();

    let output = patcher(&["apply", "--root", repo.path().to_str().unwrap(), "--diff"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--- engine/src/view.ts (original)"));
    assert!(stdout.contains("+++ engine/src/view.ts (patched)"));
    assert!(stdout.contains("const dirs = ['N','E','S','W'] as const;"));
    assert!(stdout.contains("-  const dir = player.face;"));
}

#[test]
fn rerun_exits_2_and_preserves_backup() {
    let repo = setup_repo();
    let root = repo.path().to_str().unwrap();

    let first = patcher(&["apply", "--root", root]);
    assert!(first.status.success());

    let view = view_path(repo.path());
    let after_first = fs::read_to_string(&view).unwrap();

    let second = patcher(&["apply", "--root", root]);
    assert_eq!(second.status.code(), Some(2));

    // Idempotence: the second run changed nothing on disk.
    assert_eq!(fs::read_to_string(&view).unwrap(), after_first);
    assert_eq!(fs::read_to_string(backup_of(&view)).unwrap(), VIEW_TS);
}

#[test]
fn scan_lists_candidates_read_only() {
    let repo = setup_repo();

    let output = patcher(&["scan", "--root", repo.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("1 candidate file(s):"));
    assert!(stdout.contains("- engine/src/view.ts"));
    assert_eq!(fs::read_to_string(view_path(repo.path())).unwrap(), VIEW_TS);
}

#[test]
fn scan_missing_root_exits_2() {
    let dir = TempDir::new().unwrap();

    let output = patcher(&["scan", "--root", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
