use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WorkspaceError;

pub const STAGING_DIR: &str = "staging";
pub const FRAMES_DIR: &str = "frames";
const CONCAT_MANIFEST: &str = "concat.txt";

/// The directory a task writes into. Not safe to share between concurrent tasks.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Workspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` resolves to somewhere under the root, following symlinks.
    /// Always false while the root does not exist.
    pub fn contains(&self, path: &Path) -> bool {
        match (fs::canonicalize(&self.root), fs::canonicalize(path)) {
            (Ok(root), Ok(path)) => path.starts_with(root),
            _ => false,
        }
    }

    /// Removes whatever a previous task left behind and recreates the directory empty.
    pub fn reset(&self) -> Result<(), WorkspaceError> {
        debug!(workspace = %self.root.display(), "resetting workspace");
        match fs::remove_dir_all(&self.root) {
            Ok(()) => (),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (),
            Err(err) => return Err(WorkspaceError::for_path(&self.root, err)),
        }
        fs::create_dir_all(&self.root).map_err(|err| WorkspaceError::for_path(&self.root, err))
    }

    /// Creates `name` under the workspace root and returns its path.
    pub fn subdir(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).map_err(|err| WorkspaceError::for_path(&dir, err))?;
        Ok(dir)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn concat_manifest(&self) -> PathBuf {
        self.root.join(CONCAT_MANIFEST)
    }

    pub fn output(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }
}
