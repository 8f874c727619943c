use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::ProcessError;
use super::command::TranscodeCommand;
use super::progress::consume_progress;

/// Flags put in front of every command: quiet logging, machine-readable progress on stdout,
/// overwrite without asking.
pub const GLOBAL_FLAGS: [&str; 8] = [
    "-hide_banner", "-nostats",
    "-loglevel", "warning",
    "-progress", "pipe:1",
    "-y", "-nostdin",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Executes transcoder commands to completion.
pub trait CommandRunner {
    fn run(&self, command: &TranscodeCommand) -> Result<(), ProcessError>;

    /// Runners that never launch anything produce no files, so their outputs are not checked.
    fn launches_process(&self) -> bool {
        true
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, command: &TranscodeCommand) -> Result<(), ProcessError> {
        (**self).run(command)
    }

    fn launches_process(&self) -> bool {
        (**self).launches_process()
    }
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut(Duration),
    Interrupted,
}

/// Runs the real ffmpeg executable.
#[derive(Clone, Debug)]
pub struct FfmpegRunner {
    program: PathBuf,
    timeout: Option<Duration>,
    show_progress: bool,
    stop: Option<Arc<AtomicBool>>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        FfmpegRunner {
            program: PathBuf::from("ffmpeg"),
            timeout: None,
            show_progress: false,
            stop: None,
        }
    }
}

impl FfmpegRunner {
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The running child is killed as soon as `stop` becomes true.
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn argv(&self, command: &TranscodeCommand) -> Vec<OsString> {
        GLOBAL_FLAGS
            .iter()
            .map(OsString::from)
            .chain(command.args().iter().cloned())
            .collect()
    }

    fn render(&self, command: &TranscodeCommand) -> String {
        format!("{} {} {}", self.program.display(), GLOBAL_FLAGS.join(" "), command)
    }

    fn should_stop(&self) -> bool {
        match &self.stop {
            None => false,
            Some(s) => s.load(Ordering::SeqCst),
        }
    }

    fn wait(&self, child: &mut Child) -> Result<WaitOutcome, std::io::Error> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(WaitOutcome::Exited(status));
            }

            let outcome = if self.should_stop() {
                Some(WaitOutcome::Interrupted)
            } else {
                match self.timeout {
                    Some(timeout) if started.elapsed() > timeout => Some(WaitOutcome::TimedOut(timeout)),
                    _ => None,
                }
            };

            if let Some(outcome) = outcome {
                if let Err(err) = child.kill() {
                    warn!(pid = child.id(), "error killing ffmpeg: {err}");
                }
                let _ = child.wait();
                return Ok(outcome);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CommandRunner for FfmpegRunner {
    fn run(&self, command: &TranscodeCommand) -> Result<(), ProcessError> {
        let rendered = self.render(command);
        info!(command = %rendered, "running");

        let mut child = Command::new(&self.program)
            .args(self.argv(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        let desc = command
            .output()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let show_progress = self.show_progress;
        let progress_reader = child
            .stdout
            .take()
            .map(|stdout| thread::spawn(move || consume_progress(stdout, &desc, show_progress)));
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let outcome = self.wait(&mut child);

        if let Some(reader) = progress_reader {
            let _ = reader.join();
        }
        let output = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        match outcome {
            Err(source) => Err(ProcessError::Wait { command: rendered, source }),
            Ok(WaitOutcome::Interrupted) => {
                warn!(command = %rendered, "caught stop signal; killed ffmpeg");
                Err(ProcessError::Interrupted { command: rendered })
            },
            Ok(WaitOutcome::TimedOut(timeout)) => {
                warn!(command = %rendered, ?timeout, "ffmpeg timed out; killed it");
                Err(ProcessError::TimedOut { command: rendered, timeout })
            },
            Ok(WaitOutcome::Exited(status)) => match (status.success(), status.code()) {
                (true, _) => Ok(()),
                (false, Some(exit_code)) => Err(ProcessError::Failed {
                    command: rendered,
                    exit_code,
                    output,
                }),
                (false, None) => Err(ProcessError::Terminated { command: rendered, output }),
            },
        }
    }
}

/// Logs and records commands instead of running them.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    commands: Mutex<Vec<TranscodeCommand>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        DryRunRunner::default()
    }

    pub fn commands(&self) -> Vec<TranscodeCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&self, command: &TranscodeCommand) -> Result<(), ProcessError> {
        info!(command = %format!("ffmpeg {command}"), "dry run");
        match self.commands.lock() {
            Ok(mut commands) => commands.push(command.clone()),
            Err(poisoned) => poisoned.into_inner().push(command.clone()),
        }
        Ok(())
    }

    fn launches_process(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::command::{CommandBuilder, CommandPaths};
    use crate::frame_rate::FrameRate;
    use crate::task::Task;
    use std::path::Path;

    fn audio_command() -> TranscodeCommand {
        CommandBuilder::default().build(
            Task::ExtractAudio,
            FrameRate::NATIVE,
            CommandPaths { input: Path::new("clip.mov"), output: Path::new("audio.mp3") },
        )
    }

    #[test]
    fn test_argv_prepends_global_flags() {
        let runner = FfmpegRunner::default();
        let argv = runner.argv(&audio_command());
        assert_eq!(argv[..GLOBAL_FLAGS.len()], GLOBAL_FLAGS.map(OsString::from));
        assert_eq!(argv.last().unwrap(), "audio.mp3");
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let runner = FfmpegRunner::default().program("/definitely/not/ffmpeg");
        assert!(matches!(runner.run(&audio_command()), Err(ProcessError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported() {
        // `false` ignores its arguments and exits 1
        let runner = FfmpegRunner::default().program("false");
        match runner.run(&audio_command()) {
            Err(ProcessError::Failed { command, exit_code, .. }) => {
                assert_eq!(exit_code, 1);
                assert!(command.contains("-map a"));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_is_success() {
        let runner = FfmpegRunner::default().program("true");
        assert!(runner.run(&audio_command()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_raised_stop_flag_interrupts() {
        let stop = Arc::new(AtomicBool::new(true));
        // `yes` never exits on its own
        let runner = FfmpegRunner::default().program("yes").stop_flag(stop);
        assert!(matches!(runner.run(&audio_command()), Err(ProcessError::Interrupted { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let runner = FfmpegRunner::default()
            .program("yes")
            .timeout(Some(Duration::from_millis(200)));
        assert!(matches!(runner.run(&audio_command()), Err(ProcessError::TimedOut { .. })));
    }

    #[test]
    fn test_dry_run_records() {
        let runner = DryRunRunner::new();
        runner.run(&audio_command()).unwrap();
        assert_eq!(runner.commands(), vec![audio_command()]);
        assert!(!runner.launches_process());
    }
}
