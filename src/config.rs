use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ffmpeg::command::{DEFAULT_FPS, DEFAULT_GIF_WIDTH};
use crate::ffmpeg::CommandBuilder;
use crate::workspace::Workspace;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Transcoder executable, looked up on `PATH` when relative.
    pub ffmpeg: PathBuf,
    pub workspace: PathBuf,
    /// Zero disables the timeout.
    pub timeout_secs: u64,
    pub progress: bool,
    pub gif_width: u32,
    pub default_fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ffmpeg: PathBuf::from("ffmpeg"),
            workspace: PathBuf::from("/tmp/outputs"),
            timeout_secs: 600,
            progress: true,
            gif_width: DEFAULT_GIF_WIDTH,
            default_fps: DEFAULT_FPS,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.workspace)
    }

    pub fn command_builder(&self) -> CommandBuilder {
        CommandBuilder::new(self.gif_width, self.default_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "workspace": "/srv/outputs", "timeout_secs": 0 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.workspace, PathBuf::from("/srv/outputs"));
        assert_eq!(settings.timeout(), None);
        assert_eq!(settings.gif_width, 512);
        assert_eq!(settings.default_fps, 12);
        assert_eq!(settings.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "codec": "av1" }"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Settings::load(Path::new("/definitely/not/settings.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(Settings::default().timeout(), Some(Duration::from_secs(600)));
    }
}
