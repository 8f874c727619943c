//! Forward-then-backward playback: reverse the input, then concatenate the
//! original and the reversed copy through the concat demuxer.

use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};

use tracing::debug;

use crate::error::DispatchError;
use crate::ffmpeg::CommandRunner;
use crate::dispatcher::{Dispatcher, StateLog};
use crate::frame_rate::FrameRate;
use crate::task::Task;
use crate::validate::MediaFile;

/// Ordered file list read by the concat demuxer. Always exactly two entries,
/// the original first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcatManifest {
    forward: PathBuf,
    reversed: PathBuf,
}

impl ConcatManifest {
    pub fn new(forward: impl Into<PathBuf>, reversed: impl Into<PathBuf>) -> Self {
        ConcatManifest {
            forward: forward.into(),
            reversed: reversed.into(),
        }
    }

    pub fn entries(&self) -> [&Path; 2] {
        [&self.forward, &self.reversed]
    }

    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|entry| format!("file {}\n", quote(entry)))
            .collect()
    }

    /// Writes the manifest with absolute paths, since the demuxer resolves
    /// relative entries against the manifest's own directory.
    pub fn write(&self, destination: &Path) -> io::Result<()> {
        let absolute = ConcatManifest::new(path::absolute(&self.forward)?, path::absolute(&self.reversed)?);
        fs::write(destination, absolute.render())
    }
}

/// Single-quotes `path`, closing and escaping any embedded quote.
fn quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

pub(crate) fn bounce<R: CommandRunner>(
    dispatcher: &Dispatcher<R>,
    media: &MediaFile,
    states: &mut StateLog,
) -> Result<PathBuf, DispatchError> {
    let workspace = dispatcher.workspace();
    let extension = dispatcher.output_extension(media);

    let reversed = dispatcher.transcode(
        Task::ReverseVideo,
        FrameRate::NATIVE,
        media.path(),
        workspace.output("reversed", extension),
        states,
    )?;

    let manifest_path = workspace.concat_manifest();
    let manifest = ConcatManifest::new(media.path(), &reversed);
    if dispatcher.runner().launches_process() {
        manifest
            .write(&manifest_path)
            .map_err(|source| DispatchError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;
        debug!(manifest = %manifest_path.display(), "wrote concat manifest");
    } else {
        debug!(manifest = %manifest_path.display(), contents = %manifest.render(), "dry run; concat manifest not written");
    }

    dispatcher.transcode(
        Task::BounceVideo,
        FrameRate::NATIVE,
        &manifest_path,
        workspace.output("bounce", extension),
        states,
    )
}
