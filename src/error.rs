use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Input rejected before anything is written to the workspace.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown task {0:?}")]
    UnknownTask(String),

    #[error("frame rate must be a non-negative integer (got {0})")]
    InvalidFrameRate(i64),

    #[error("{path:?} does not exist")]
    MissingInput { path: PathBuf },

    #[error("{path:?} is not a regular file")]
    NotAFile { path: PathBuf },

    #[error("{path:?} has extension {extension:?}; input must be one of: {allowed}")]
    UnsupportedExtension {
        path: PathBuf,
        extension: String,
        allowed: String,
    },

    #[error("{path:?} must be a .zip archive")]
    NotAZip { path: PathBuf },

    #[error("{path:?} is inside the workspace {workspace:?}, which is cleared before every task; move or copy it out first")]
    InsideWorkspace { path: PathBuf, workspace: PathBuf },
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no jpg, jpeg or png images found in {dir:?}")]
    NoImagesFound { dir: PathBuf },
}

/// Failure of a single external transcoder invocation.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("unable to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {exit_code}\n{output}")]
    Failed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("`{command}` was terminated by a signal\n{output}")]
    Terminated { command: String, output: String },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("`{command}` was interrupted")]
    Interrupted { command: String },

    #[error("error waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[error("unable to prepare workspace {path:?}: {source}")]
pub struct WorkspaceError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WorkspaceError {
    pub fn for_path(path: &Path, source: io::Error) -> Self {
        WorkspaceError {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a task can fail with. No variant carries partial output.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("unable to write concat manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("expected output {path:?} was not produced")]
    MissingOutput { path: PathBuf },
}
