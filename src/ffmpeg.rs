use std::path::PathBuf;
use std::process::{Command, Stdio};

pub mod command;
pub mod progress;
pub mod runner;

pub use command::{CommandBuilder, CommandPaths, TranscodeCommand};
pub use runner::{CommandRunner, DryRunRunner, FfmpegRunner};

pub struct FFmpeg {
    program: PathBuf,
}

impl FFmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        FFmpeg { program: program.into() }
    }

    pub fn is_installed(&self) -> bool {
        let cmd = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match cmd {
            Ok(status) => status.success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_not_installed() {
        assert!(!FFmpeg::new("/definitely/not/ffmpeg").is_installed());
    }
}
