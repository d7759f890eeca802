/// Workspace Manager
///
/// One exclusively owned scratch directory per execution. The source is
/// written into it on acquisition and the whole tree (compiled artifacts
/// included) is removed on release.
///
/// Teardown runs exactly once: either through [`Workspace::release`] or,
/// on early return, panic or a dropped future, through `Drop`.
use crate::error::{EngineError, EngineResult};
use crate::registry::LanguageProfile;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "coderun-";

#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    source_path: PathBuf,
    artifact_path: PathBuf,
}

impl Workspace {
    /// Create a fresh uniquely named directory under `root` and write `source` into it
    pub fn acquire(root: &Path, profile: &LanguageProfile, source: &str) -> EngineResult<Self> {
        let root = absolute_root(root)?;
        let map_err = |source| EngineError::Workspace {
            root: root.clone(),
            source,
        };

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&root)
            .map_err(map_err)?;

        let path = dir.path().to_path_buf();
        let source_path = path.join(profile.source_file_name());
        let artifact_path = path.join(profile.file_stem);

        // The guard is live from here on, so a failed write still cleans up
        let workspace = Self {
            dir: Some(dir),
            path,
            source_path,
            artifact_path,
        };

        std::fs::write(&workspace.source_path, source).map_err(map_err)?;
        debug!(path = %workspace.path.display(), "Workspace acquired");

        Ok(workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Recursively remove the workspace
    ///
    /// Failures are logged and swallowed.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "Workspace released"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn absolute_root(root: &Path) -> EngineResult<PathBuf> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(root))
        .map_err(|source| EngineError::Workspace {
            root: root.to_path_buf(),
            source,
        })
}
