#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    H264,
    AAC,
    GIF,
}

impl Codec {
    /// Encoder name passed to `-c:v` / `-c:a`.
    pub fn encoder(&self) -> &'static str {
        match self {
            Codec::H264 => "libx264",
            Codec::AAC => "aac",
            Codec::GIF => "gif",
        }
    }
}
