//! ToolContext - per-run execution context handed to every tool

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ToolError;

/// Execution context for tools
///
/// File tools resolve paths against `workdir` and refuse anything that
/// escapes it. The cancellation token is the run's token.
#[derive(Clone)]
pub struct ToolContext {
    /// Directory file tools are confined to
    pub workdir: PathBuf,

    /// Run identifier, for logging
    pub run_id: String,

    cancel: CancellationToken,
}

impl ToolContext {
    /// Create a new tool context
    ///
    /// The workdir is canonicalized up front so a relative `.` compares
    /// cleanly against resolved paths.
    pub fn new(workdir: PathBuf, run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        debug!(?workdir, %run_id, "ToolContext::new: called");
        let workdir = workdir.canonicalize().unwrap_or(workdir);
        Self {
            workdir,
            run_id,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder method to share a run's cancellation token
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The run's cancellation token
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`ToolError::Cancelled`] once the run is cancelled
    pub fn check_cancelled(&self) -> Result<(), ToolError> {
        if self.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        Ok(())
    }

    /// Normalize a path relative to the working directory
    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }

    /// Validate path is within the working directory (sandbox enforcement)
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "ToolContext::validate_path: called");
        let normalized = self.normalize_path(path);

        // Resolve symlinks and `..` through the nearest existing ancestor;
        // the missing tail is appended as written
        let mut existing = normalized.as_path();
        let mut tail = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }
        let mut canonical = existing.canonicalize().unwrap_or_else(|_| existing.to_path_buf());
        canonical.extend(tail.iter().rev());

        if canonical.starts_with(&self.workdir) && !has_parent_component(&canonical) {
            debug!("ToolContext::validate_path: path is within working directory");
            Ok(canonical)
        } else {
            debug!("ToolContext::validate_path: sandbox violation detected");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                workdir: self.workdir.clone(),
            })
        }
    }

    /// Display a path relative to the working directory
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.workdir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

/// Uncanonicalized paths may still carry `..` when their parent is missing
fn has_parent_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, std::path::Component::ParentDir))
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("workdir", &self.workdir)
            .field("run_id", &self.run_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_path_within_workdir() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "content").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");
        assert!(ctx.validate_path(Path::new("test.txt")).is_ok());
    }

    #[test]
    fn test_validate_path_outside_workdir() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");

        let result = ctx.validate_path(Path::new("/etc/passwd"));
        assert!(matches!(result.unwrap_err(), ToolError::SandboxViolation { .. }));
    }

    #[test]
    fn test_validate_path_parent_escape() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");

        assert!(ctx.validate_path(Path::new("../outside.txt")).is_err());
        assert!(ctx.validate_path(Path::new("missing/../../outside.txt")).is_err());
    }

    #[test]
    fn test_validate_new_file_path() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");

        assert!(ctx.validate_path(Path::new("new_file.txt")).is_ok());
    }

    #[test]
    fn test_validate_nested_new_path() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");

        let resolved = ctx.validate_path(Path::new("sub/deeper/new.txt")).unwrap();
        assert!(resolved.starts_with(temp.path().canonicalize().unwrap()));
        assert!(resolved.ends_with("sub/deeper/new.txt"));
    }

    #[test]
    fn test_relative_workdir_accepts_nested_new_path() {
        let temp = tempfile::Builder::new().tempdir_in(".").unwrap();
        assert!(temp.path().is_relative());

        let ctx = ToolContext::new(temp.path().to_path_buf(), "run-1");
        assert!(ctx.workdir.is_absolute());
        assert!(ctx.validate_path(Path::new("nested_dir/new.txt")).is_ok());
        assert!(ctx.validate_path(Path::new("../outside.txt")).is_err());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancellationToken::new();
        let ctx = ToolContext::new(PathBuf::from("."), "run-1").with_cancel_token(token.clone());

        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check_cancelled(), Err(ToolError::Cancelled)));
    }
}
