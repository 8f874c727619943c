use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::containers::Container;
use crate::error::ValidationError;

/// What kind of file a task expects as input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCategory {
    /// A single video or (animated) image file.
    Media,
    /// A zip archive of still frames.
    Archive,
}

/// One named operation with a fixed input and output shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Task {
    ConvertToContainer(Container),
    ExtractAudio,
    ExtractFrames,
    FramesToVideo(Container),
    ReverseVideo,
    BounceVideo,
}

impl Task {
    pub const ALL: [Task; 8] = [
        Task::ExtractAudio,
        Task::ConvertToContainer(Container::MP4),
        Task::ConvertToContainer(Container::GIF),
        Task::FramesToVideo(Container::MP4),
        Task::FramesToVideo(Container::GIF),
        Task::ExtractFrames,
        Task::ReverseVideo,
        Task::BounceVideo,
    ];

    /// Canonical identifier used on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Task::ExtractAudio => "extract_video_audio_as_mp3",
            Task::ConvertToContainer(Container::MP4) => "convert_input_to_mp4",
            Task::ConvertToContainer(Container::GIF) => "convert_input_to_gif",
            Task::FramesToVideo(Container::MP4) => "zipped_frames_to_mp4",
            Task::FramesToVideo(Container::GIF) => "zipped_frames_to_gif",
            Task::ExtractFrames => "extract_frames_from_input",
            Task::ReverseVideo => "reverse_video",
            Task::BounceVideo => "bounce_video",
        }
    }

    pub fn input_category(&self) -> InputCategory {
        match self {
            Task::FramesToVideo(_) => InputCategory::Archive,
            _ => InputCategory::Media,
        }
    }
}

impl FromStr for Task {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "extract_video_audio_as_mp3" => Ok(Task::ExtractAudio),
            "convert_to_mp4" | "convert_input_to_mp4" => Ok(Task::ConvertToContainer(Container::MP4)),
            "convert_to_gif" | "convert_input_to_gif" => Ok(Task::ConvertToContainer(Container::GIF)),
            "zipped_frames_to_mp4" => Ok(Task::FramesToVideo(Container::MP4)),
            "zipped_frames_to_gif" => Ok(Task::FramesToVideo(Container::GIF)),
            "extract_frames_from_input" => Ok(Task::ExtractFrames),
            "reverse_video" => Ok(Task::ReverseVideo),
            "bounce_video" => Ok(Task::BounceVideo),
            other => Err(ValidationError::UnknownTask(String::from(other))),
        }
    }
}

impl TryFrom<String> for Task {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Task> for String {
    fn from(task: Task) -> Self {
        String::from(task.id())
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_back() {
        for task in Task::ALL {
            assert_eq!(task.id().parse::<Task>().unwrap(), task);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("convert_to_mp4".parse::<Task>().unwrap(), Task::ConvertToContainer(Container::MP4));
        assert_eq!("convert_to_gif".parse::<Task>().unwrap(), Task::ConvertToContainer(Container::GIF));
    }

    #[test]
    fn test_unknown_task() {
        assert!(matches!("make_coffee".parse::<Task>(), Err(ValidationError::UnknownTask(_))));
    }

    #[test]
    fn test_input_category() {
        assert_eq!(Task::FramesToVideo(Container::GIF).input_category(), InputCategory::Archive);
        assert_eq!(Task::BounceVideo.input_category(), InputCategory::Media);
        assert_eq!(Task::ExtractFrames.input_category(), InputCategory::Media);
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Task::ReverseVideo).unwrap();
        assert_eq!(json, "\"reverse_video\"");
        let task: Task = serde_json::from_str("\"convert_to_gif\"").unwrap();
        assert_eq!(task, Task::ConvertToContainer(Container::GIF));
    }
}
