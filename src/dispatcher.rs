use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Instant;

use human_repr::{HumanCount, HumanDuration};
use tracing::{debug, info, warn};

use crate::archive::{self, StagingArea};
use crate::bounce;
use crate::containers::Container;
use crate::error::{ArchiveError, DispatchError, ValidationError};
use crate::ffmpeg::{CommandBuilder, CommandPaths, CommandRunner};
use crate::frame_rate::FrameRate;
use crate::fstools::file_size;
use crate::task::Task;
use crate::validate::{validate, MediaFile};
use crate::workspace::{Workspace, FRAMES_DIR};

/// Numbered output pattern for extracted frames.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Validating,
    WorkspaceReset,
    Staging,
    CommandBuilding,
    Executing,
    Collecting,
    Done,
    Failed,
}

impl Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// The states one dispatch went through, in order.
#[derive(Debug)]
pub struct StateLog {
    task: Task,
    states: Vec<DispatchState>,
}

impl StateLog {
    fn new(task: Task) -> Self {
        StateLog {
            task,
            states: vec![DispatchState::Idle],
        }
    }

    pub fn current(&self) -> DispatchState {
        self.states.last().copied().unwrap_or(DispatchState::Idle)
    }

    pub fn states(&self) -> &[DispatchState] {
        &self.states
    }

    fn enter(&mut self, next: DispatchState) {
        debug!(task = %self.task, from = %self.current(), to = %next, "state");
        self.states.push(next);
    }
}

/// Runs one task at a time against a single workspace.
pub struct Dispatcher<R: CommandRunner> {
    runner: R,
    workspace: Workspace,
    builder: CommandBuilder,
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(runner: R, workspace: Workspace, builder: CommandBuilder) -> Self {
        Dispatcher {
            runner,
            workspace,
            builder,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Runs `task` on `input` and returns the produced files. Nothing partial is returned on failure.
    pub fn dispatch(&self, task: Task, input: &Path, fps: FrameRate) -> Result<Vec<PathBuf>, DispatchError> {
        self.dispatch_logged(task, input, fps).0
    }

    /// Like [`Dispatcher::dispatch`], also handing back the state transitions taken.
    pub fn dispatch_logged(
        &self,
        task: Task,
        input: &Path,
        fps: FrameRate,
    ) -> (Result<Vec<PathBuf>, DispatchError>, StateLog) {
        let started = Instant::now();
        let mut states = StateLog::new(task);
        info!(%task, input = %input.display(), %fps, "task started");

        let result = self.run_task(task, input, fps, &mut states);
        match &result {
            Ok(outputs) => {
                states.enter(DispatchState::Done);
                for output in outputs {
                    info!(output = %output.display(), size = %file_size(output).human_count_bytes(), "produced");
                }
                info!(%task, elapsed = %started.elapsed().as_secs_f64().human_duration(), "task finished");
            },
            Err(err) => {
                states.enter(DispatchState::Failed);
                warn!(%task, "task failed: {err}");
            },
        }
        (result, states)
    }

    fn run_task(
        &self,
        task: Task,
        input: &Path,
        fps: FrameRate,
        states: &mut StateLog,
    ) -> Result<Vec<PathBuf>, DispatchError> {
        states.enter(DispatchState::Validating);
        let media = validate(task, input)?;
        if self.workspace.contains(media.path()) {
            return Err(ValidationError::InsideWorkspace {
                path: media.path().to_path_buf(),
                workspace: self.workspace.root().to_path_buf(),
            }
            .into());
        }

        states.enter(DispatchState::WorkspaceReset);
        if self.runner.launches_process() {
            self.workspace.reset()?;
        } else {
            debug!(workspace = %self.workspace.root().display(), "dry run; workspace left untouched");
        }

        let outputs = match task {
            Task::ConvertToContainer(target) => vec![self.transcode(
                task,
                fps,
                media.path(),
                self.workspace.output("converted", target.extension()),
                states,
            )?],
            Task::ExtractAudio => vec![self.transcode(
                task,
                fps,
                media.path(),
                self.workspace.output("audio", "mp3"),
                states,
            )?],
            Task::ExtractFrames => vec![self.extract_frames(&media, fps, states)?],
            Task::FramesToVideo(target) => vec![self.frames_to_video(&media, target, fps, states)?],
            Task::ReverseVideo => vec![self.transcode(
                task,
                fps,
                media.path(),
                self.workspace.output("reversed", self.output_extension(&media)),
                states,
            )?],
            Task::BounceVideo => vec![bounce::bounce(self, &media, states)?],
        };

        states.enter(DispatchState::Collecting);
        self.collect(outputs)
    }

    /// Builds and runs one command, returning its output path.
    pub(crate) fn transcode(
        &self,
        task: Task,
        fps: FrameRate,
        input: &Path,
        output: PathBuf,
        states: &mut StateLog,
    ) -> Result<PathBuf, DispatchError> {
        states.enter(DispatchState::CommandBuilding);
        let command = self.builder.build(task, fps, CommandPaths { input, output: &output });

        states.enter(DispatchState::Executing);
        self.runner.run(&command)?;
        Ok(output)
    }

    /// Extension for outputs that keep the input's container. Gif-family inputs become `.gif`.
    pub(crate) fn output_extension<'a>(&self, media: &'a MediaFile) -> &'a str {
        match Container::for_extension(media.extension()) {
            Container::GIF => Container::GIF.extension(),
            Container::MP4 => media.extension(),
        }
    }

    fn extract_frames(&self, media: &MediaFile, fps: FrameRate, states: &mut StateLog) -> Result<PathBuf, DispatchError> {
        let live = self.runner.launches_process();
        let frames_dir = if live {
            self.workspace.subdir(FRAMES_DIR)?
        } else {
            self.workspace.root().join(FRAMES_DIR)
        };
        self.transcode(Task::ExtractFrames, fps, media.path(), frames_dir.join(FRAME_PATTERN), states)?;

        let destination = self.workspace.output("frames", "zip");
        if !live {
            return Ok(destination);
        }

        let frames = archive::list_files(&frames_dir)?;
        debug!(frames = frames.len(), "extracted frames");
        if frames.is_empty() {
            return Err(ArchiveError::NoImagesFound { dir: frames_dir }.into());
        }
        archive::pack(&frames, &destination)?;
        Ok(destination)
    }

    fn frames_to_video(
        &self,
        media: &MediaFile,
        target: Container,
        fps: FrameRate,
        states: &mut StateLog,
    ) -> Result<PathBuf, DispatchError> {
        states.enter(DispatchState::Staging);
        let (staging, extension) = if self.runner.launches_process() {
            let staging = archive::extract(media.path(), &self.workspace.staging_dir())?;
            let extension = archive::detect_image_extension(&staging)?;
            (staging, extension)
        } else {
            let extension = archive::detect_archive_image_extension(media.path())?;
            (StagingArea::new(self.workspace.staging_dir()), extension)
        };
        debug!(staging = %staging.dir().display(), %extension, "staged frames");

        self.transcode(
            Task::FramesToVideo(target),
            fps,
            &staging.glob(&extension),
            self.workspace.output("video", target.extension()),
            states,
        )
    }

    fn collect(&self, outputs: Vec<PathBuf>) -> Result<Vec<PathBuf>, DispatchError> {
        if self.runner.launches_process() {
            if let Some(missing) = outputs.iter().find(|o| !o.is_file()) {
                return Err(DispatchError::MissingOutput { path: missing.clone() });
            }
        }
        Ok(outputs)
    }
}
