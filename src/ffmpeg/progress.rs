use std::io::{BufRead, BufReader, Read};

use human_repr::HumanCount;
use kdam::{term, tqdm, BarExt};

/// Latest values reported by `-progress pipe:1`.
#[derive(Debug, Default, PartialEq)]
pub struct TranscodeProgress {
    pub frame: usize,
    pub fps: f64,
    pub total_size: usize,
    pub finished: bool,
}

#[derive(Debug, PartialEq)]
pub enum ProgressLine {
    Continue,
    Render,
}

impl TranscodeProgress {
    /// Folds one `key=value` line into the progress; a `progress=` line closes a block.
    pub fn update(&mut self, line: &str) -> ProgressLine {
        let Some((key, value)) = line.trim().split_once('=') else {
            return ProgressLine::Continue;
        };
        match key {
            "fps" => self.fps = value.parse().unwrap_or(self.fps),
            "frame" => self.frame = value.parse().unwrap_or(self.frame),
            "total_size" => self.total_size = value.parse().unwrap_or(self.total_size),
            "progress" => {
                self.finished = value == "end";
                return ProgressLine::Render;
            },
            _ => (),
        }
        ProgressLine::Continue
    }
}

/// Drains the transcoder's progress stream, optionally drawing a bar on stderr.
pub fn consume_progress(stdout: impl Read, desc: &str, show_bar: bool) -> TranscodeProgress {
    let mut progress = TranscodeProgress::default();
    let mut pbar = show_bar.then(|| {
        term::init(false);
        tqdm!(
            desc = String::from(desc),
            unit = " frames",
            position = 0,
            force_refresh = true
        )
    });

    for line in BufReader::new(stdout).lines().map_while(Result::ok) {
        if progress.update(&line) == ProgressLine::Render {
            if let Some(bar) = pbar.as_mut() {
                bar.set_postfix(format!("{} @ {:.1} fps", progress.total_size.human_count_bytes(), progress.fps));
                let _ = bar.update_to(progress.frame);
            }
        }
    }

    if let Some(bar) = pbar.as_mut() {
        let _ = bar.refresh();
        eprintln!();
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update() {
        let mut progress = TranscodeProgress::default();
        assert_eq!(progress.update("frame=42"), ProgressLine::Continue);
        assert_eq!(progress.update("fps=23.5"), ProgressLine::Continue);
        assert_eq!(progress.update("total_size=1024"), ProgressLine::Continue);
        assert_eq!(progress.update("garbage"), ProgressLine::Continue);
        assert_eq!(progress.update("frame=not-a-number"), ProgressLine::Continue);
        assert_eq!(progress.update("progress=continue"), ProgressLine::Render);
        assert_eq!(progress.frame, 42);
        assert_eq!(progress.fps, 23.5);
        assert_eq!(progress.total_size, 1024);
        assert!(!progress.finished);
    }

    #[test]
    fn test_consume_progress_without_bar() {
        let stream = "frame=1\nprogress=continue\nframe=10\ntotal_size=2048\nprogress=end\n";
        let progress = consume_progress(stream.as_bytes(), "test", false);
        assert_eq!(progress.frame, 10);
        assert_eq!(progress.total_size, 2048);
        assert!(progress.finished);
    }
}
