use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::fstools::{classify_file, lowercase_extension, DirEntryCategory};
use crate::task::{InputCategory, Task};

/// Extensions accepted by tasks that take a single video or image.
pub const VIDEO_FILE_EXTENSIONS: [&str; 27] = [
    "3g2", "3gp", "a64", "avi", "flv", "gif", "gifv", "m2v", "m4v", "mkv",
    "mov", "mp4", "mpeg", "mpg", "mv", "mxf", "nsv", "ogg", "ogv", "rm",
    "rmvb", "roq", "svi", "vob", "webm", "wmv", "yuv",
];

pub const ARCHIVE_EXTENSION: &str = "zip";

/// An input path that passed validation for some task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFile {
    path: PathBuf,
    extension: String,
}

impl MediaFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Base name without the extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Checks that `input` exists and its extension fits the task's input category.
pub fn validate(task: Task, input: &Path) -> Result<MediaFile, ValidationError> {
    match classify_file(input) {
        DirEntryCategory::RegularFile => (),
        // followed symlinks are fine as long as they land on a file
        DirEntryCategory::SymbolicLink if input.is_file() => (),
        DirEntryCategory::DoesNotExist => {
            return Err(ValidationError::MissingInput { path: input.to_path_buf() })
        },
        _ => return Err(ValidationError::NotAFile { path: input.to_path_buf() }),
    }

    let extension = lowercase_extension(input);
    match task.input_category() {
        InputCategory::Archive if extension != ARCHIVE_EXTENSION => {
            Err(ValidationError::NotAZip { path: input.to_path_buf() })
        },
        InputCategory::Media if !is_video_extension(&extension) => {
            Err(ValidationError::UnsupportedExtension {
                path: input.to_path_buf(),
                extension,
                allowed: VIDEO_FILE_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<String>>()
                    .join(", "),
            })
        },
        _ => Ok(MediaFile {
            path: input.to_path_buf(),
            extension,
        }),
    }
}

pub fn is_video_extension(extension: &str) -> bool {
    let extension = extension.trim_start_matches('.').to_lowercase();
    VIDEO_FILE_EXTENSIONS.contains(&extension.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::Container;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_accepts_every_allowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        for ext in VIDEO_FILE_EXTENSIONS {
            let upper = touch(dir.path(), &format!("clip.{}", ext.to_uppercase()));
            let media = validate(Task::ReverseVideo, &upper).unwrap();
            assert_eq!(media.extension(), ext);
        }
    }

    #[test]
    fn test_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["notes.txt", "frames.zip", "photo.png", "noext"] {
            let path = touch(dir.path(), name);
            assert!(matches!(
                validate(Task::ExtractAudio, &path),
                Err(ValidationError::UnsupportedExtension { .. })
            ));
        }
    }

    #[test]
    fn test_archive_tasks_require_zip() {
        let dir = tempfile::tempdir().unwrap();
        let zip = touch(dir.path(), "Frames.ZIP");
        let mp4 = touch(dir.path(), "clip.mp4");

        assert!(validate(Task::FramesToVideo(Container::MP4), &zip).is_ok());
        assert!(matches!(
            validate(Task::FramesToVideo(Container::GIF), &mp4),
            Err(ValidationError::NotAZip { .. })
        ));
    }

    #[test]
    fn test_missing_and_directory_inputs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate(Task::ExtractAudio, &dir.path().join("gone.mp4")),
            Err(ValidationError::MissingInput { .. })
        ));
        assert!(matches!(
            validate(Task::ExtractAudio, dir.path()),
            Err(ValidationError::NotAFile { .. })
        ));
    }

    #[test]
    fn test_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "holiday.clip.mov");
        assert_eq!(validate(Task::ReverseVideo, &path).unwrap().stem(), "holiday.clip");
    }
}
