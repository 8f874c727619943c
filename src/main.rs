use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rustop::opts;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{error, warn};
use tracing_subscriber::prelude::*;

use media_dispatch::ffmpeg::{CommandRunner, DryRunRunner, FFmpeg, FfmpegRunner};
use media_dispatch::{Dispatcher, FrameRate, Settings, Task};

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Run a media task (convert, extract audio/frames, frames to video, reverse, bounce) with ffmpeg.";
        opt fps:i64=0, desc:"Frames per second. 0 uses the tool default (12 for gif and frame sequences).";
        opt workspace:Option<String>, desc:"Output directory, cleared before every task.";
        opt timeout:Option<u64>, desc:"Seconds before a hung ffmpeg is killed. 0 disables the timeout.";
        opt program:Option<String>, desc:"ffmpeg executable to run.";
        opt config:Option<String>, desc:"JSON settings file.";
        opt dry_run:bool=false, desc:"Log the ffmpeg commands without running them; the workspace is left untouched.";
        opt json:bool=false, desc:"Print output paths as a JSON array.";
        opt no_progress:bool=false, desc:"Don't draw a progress bar.";
        opt verbose:bool=false, desc:"Log state transitions and staged files.";
        param task:String, desc:"Task to perform. One of extract_video_audio_as_mp3, convert_input_to_mp4, convert_input_to_gif, zipped_frames_to_mp4, zipped_frames_to_gif, extract_frames_from_input, reverse_video, bounce_video.";
        param input:String, desc:"Input file: zip, image or video.";
    }.parse_or_exit();

    init_tracing(args.verbose);

    let mut settings = match &args.config {
        None => Settings::default(),
        Some(path) => match Settings::load(Path::new(path)) {
            Ok(settings) => settings,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            },
        },
    };
    if let Some(workspace) = &args.workspace {
        settings.workspace = PathBuf::from(workspace);
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(program) = &args.program {
        settings.ffmpeg = PathBuf::from(program);
    }
    if args.no_progress {
        settings.progress = false;
    }

    let task: Task = match args.task.parse() {
        Ok(task) => task,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };
    let fps = match FrameRate::try_from(args.fps) {
        Ok(fps) => fps,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };
    let input = PathBuf::from(&args.input);

    if args.dry_run {
        let dispatcher = Dispatcher::new(DryRunRunner::new(), settings.workspace(), settings.command_builder());
        return run(&dispatcher, task, &input, fps, args.json);
    }

    if !FFmpeg::new(&settings.ffmpeg).is_installed() {
        error!("{} is not installed.", settings.ffmpeg.display());
        return ExitCode::FAILURE;
    }

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            warn!(signal, "unable to register signal handler: {err}");
        }
    }

    let runner = FfmpegRunner::default()
        .program(&settings.ffmpeg)
        .timeout(settings.timeout())
        .show_progress(settings.progress && std::io::stderr().is_terminal())
        .stop_flag(stop);
    let dispatcher = Dispatcher::new(runner, settings.workspace(), settings.command_builder());
    run(&dispatcher, task, &input, fps, args.json)
}

fn run<R: CommandRunner>(dispatcher: &Dispatcher<R>, task: Task, input: &Path, fps: FrameRate, json: bool) -> ExitCode {
    let outputs = match dispatcher.dispatch(task, input, fps) {
        Ok(outputs) => outputs,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };

    if json {
        match serde_json::to_string(&outputs) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                error!("unable to render outputs: {err}");
                return ExitCode::FAILURE;
            },
        }
    } else {
        for output in &outputs {
            println!("{}", output.display());
        }
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
