use std::ffi::{OsStr, OsString};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::codecs::Codec;
use crate::containers::Container;
use crate::frame_rate::FrameRate;
use crate::fstools::lowercase_extension;
use crate::task::Task;

pub const DEFAULT_GIF_WIDTH: u32 = 512;
pub const DEFAULT_FPS: u32 = 12;

/// Pixel format every mp4 output is forced to, for player compatibility.
const PIX_FMT: &str = "yuv420p";

/// Arguments for one transcoder invocation, excluding the executable and global flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodeCommand {
    args: Vec<OsString>,
    output: PathBuf,
}

impl TranscodeCommand {
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|v| v.as_os_str())
    }
}

impl Display for TranscodeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.args
            .iter()
            .map(|a| {
                let s = a.to_string_lossy();
                if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
                    format!("{:?}", s)
                } else {
                    s.into_owned()
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

struct Args {
    args: Vec<OsString>,
}

impl Args {
    fn new() -> Self {
        Args { args: vec![] }
    }

    fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    fn pair(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    fn pair_if(self, flag: &str, value: Option<impl AsRef<OsStr>>) -> Self {
        match value {
            Some(v) => self.pair(flag, v),
            None => self,
        }
    }

    fn output(self, output: &Path) -> TranscodeCommand {
        let args = self.arg(output).args;
        TranscodeCommand {
            args,
            output: output.to_path_buf(),
        }
    }
}

/// Input and output of a single build. For frames-to-video the input is a glob,
/// for bounce it is the concat manifest.
#[derive(Clone, Copy, Debug)]
pub struct CommandPaths<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
}

/// Turns a task into transcoder arguments. Holds only policy, never per-task state.
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    gif_width: u32,
    default_fps: u32,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        CommandBuilder::new(DEFAULT_GIF_WIDTH, DEFAULT_FPS)
    }
}

impl CommandBuilder {
    pub fn new(gif_width: u32, default_fps: u32) -> Self {
        CommandBuilder { gif_width, default_fps }
    }

    pub fn build(&self, task: Task, fps: FrameRate, paths: CommandPaths) -> TranscodeCommand {
        match task {
            Task::ConvertToContainer(target) => self.convert(paths, target, fps),
            Task::ExtractAudio => self.extract_audio(paths),
            Task::ExtractFrames => self.extract_frames(paths, fps),
            Task::FramesToVideo(target) => self.frames_to_video(paths, target, fps),
            Task::ReverseVideo => self.reverse(paths),
            Task::BounceVideo => self.concat(paths),
        }
    }

    fn convert(&self, paths: CommandPaths, target: Container, fps: FrameRate) -> TranscodeCommand {
        let args = Args::new().pair("-i", paths.input);
        match target {
            Container::MP4 => mp4_encoding(args)
                .pair("-c:a", Codec::AAC.encoder())
                .pair("-q:a", "0")
                .pair_if("-r", fps.explicit().map(|r| r.to_string()))
                .output(paths.output),
            Container::GIF => args
                .pair("-vf", format!("fps={},{}", fps.or(self.default_fps), self.gif_scale()))
                .pair("-c:v", Codec::GIF.encoder())
                .output(paths.output),
        }
    }

    fn extract_audio(&self, paths: CommandPaths) -> TranscodeCommand {
        Args::new()
            .pair("-i", paths.input)
            .pair("-q:a", "0")
            .pair("-map", "a")
            .output(paths.output)
    }

    fn extract_frames(&self, paths: CommandPaths, fps: FrameRate) -> TranscodeCommand {
        Args::new()
            .pair("-i", paths.input)
            .pair_if("-vf", fps.explicit().map(|r| format!("fps={r}")))
            .output(paths.output)
    }

    fn frames_to_video(&self, paths: CommandPaths, target: Container, fps: FrameRate) -> TranscodeCommand {
        // input reading rate, so it goes before -i
        let args = Args::new()
            .pair("-framerate", fps.or(self.default_fps).to_string())
            .pair("-pattern_type", "glob")
            .pair("-i", paths.input);
        match target {
            Container::MP4 => mp4_encoding(args).output(paths.output),
            Container::GIF => args
                .pair("-vf", self.gif_scale())
                .pair("-c:v", Codec::GIF.encoder())
                .output(paths.output),
        }
    }

    fn reverse(&self, paths: CommandPaths) -> TranscodeCommand {
        let container = Container::for_extension(&lowercase_extension(paths.output));
        Args::new()
            .pair("-i", paths.input)
            .pair("-vf", "reverse")
            .pair_if("-af", container.has_audio().then_some("areverse"))
            .output(paths.output)
    }

    fn concat(&self, paths: CommandPaths) -> TranscodeCommand {
        let args = Args::new()
            .pair("-f", "concat")
            .pair("-safe", "0")
            .pair("-i", paths.input);
        match Container::for_extension(&lowercase_extension(paths.output)) {
            Container::GIF => args
                .pair("-vf", self.gif_scale())
                .pair("-c:v", Codec::GIF.encoder())
                .output(paths.output),
            Container::MP4 => args.pair("-c", "copy").output(paths.output),
        }
    }

    fn gif_scale(&self) -> String {
        format!("scale={}:-1:flags=lanczos", self.gif_width)
    }
}

fn mp4_encoding(args: Args) -> Args {
    args.pair("-pix_fmt", PIX_FMT).pair("-c:v", Codec::H264.encoder())
}
