use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subtrees of the project root that must never be patched.
const FORBIDDEN_SUBDIRS: [&str; 2] = ["node_modules", ".git"];

/// Boundary checks to prevent patching files outside the target project.
///
/// The engine tree belongs to an npm project; a stray symlink under
/// `engine/src` could point into `node_modules` or out of the repository
/// entirely, and a patch there would be silently destructive.
#[derive(Debug, Clone)]
pub struct EngineGuard {
    /// Absolute path to the project root
    project_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl EngineGuard {
    /// Create a new guard for the given project root.
    ///
    /// The root is canonicalized so symlinked checkouts compare correctly.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let project_root = project_root.as_ref().canonicalize()?;

        let mut forbidden_paths = Vec::new();
        for sub in FORBIDDEN_SUBDIRS {
            if let Ok(dir) = project_root.join(sub).canonicalize() {
                forbidden_paths.push(dir);
            }
        }

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to patch.
    ///
    /// Returns the canonicalized absolute path if safe. Canonicalization
    /// resolves symlinks, so an `engine/src` entry that escapes the root
    /// is rejected here no matter what the scan saw.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let canonical = absolute.canonicalize()?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.project_root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical.to_path_buf(),
                root: self.project_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_path_inside_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let guard = EngineGuard::new(root).unwrap();

        let file = root.join("engine/src/view.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_path_outside_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("repo");
        fs::create_dir_all(&root).unwrap();
        let guard = EngineGuard::new(&root).unwrap();

        let outside = temp_dir.path().join("outside.ts");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(SafetyError::OutsideRoot { .. })));
    }

    #[test]
    fn test_validate_path_node_modules_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let forbidden = root.join("node_modules/engine-lib");
        fs::create_dir_all(&forbidden).unwrap();

        let file = forbidden.join("view.ts");
        fs::write(&file, b"").unwrap();

        let guard = EngineGuard::new(root).unwrap();
        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_validate_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let guard = EngineGuard::new(root).unwrap();

        let file = root.join("view.ts");
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path("view.ts");
        assert!(result.is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("repo");
        fs::create_dir_all(root.join("engine/src")).unwrap();

        let outside = temp_dir.path().join("outside.ts");
        fs::write(&outside, b"").unwrap();

        let link = root.join("engine/src/escape.ts");
        symlink(&outside, &link).unwrap();

        let guard = EngineGuard::new(&root).unwrap();
        let result = guard.validate_path(&link);

        // Canonical path resolves outside the root
        assert!(matches!(result, Err(SafetyError::OutsideRoot { .. })));
    }
}
