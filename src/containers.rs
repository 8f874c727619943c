use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Output container a task can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    MP4,
    GIF,
}

impl Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl Container {
    pub fn extension(&self) -> &'static str {
        match self {
            Container::MP4 => "mp4",
            Container::GIF => "gif",
        }
    }

    /// Gif-family inputs get the gif pipeline, everything else is treated as a regular video.
    pub fn for_extension(extension: &str) -> Container {
        match extension.to_lowercase().as_str() {
            "gif" | "gifv" => Container::GIF,
            _ => Container::MP4,
        }
    }

    pub fn has_audio(&self) -> bool {
        match self {
            Container::MP4 => true,
            Container::GIF => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string() {
        assert_eq!(Container::MP4.to_string(), String::from("mp4"));
        assert_eq!(Container::GIF.to_string(), String::from("gif"));
    }

    #[test]
    fn test_for_extension() {
        assert_eq!(Container::for_extension("GIF"), Container::GIF);
        assert_eq!(Container::for_extension("gifv"), Container::GIF);
        assert_eq!(Container::for_extension("mov"), Container::MP4);
        assert!(!Container::for_extension("gif").has_audio());
    }
}
