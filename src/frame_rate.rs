use std::fmt::Display;

use crate::error::ValidationError;

/// Requested frames per second. Zero means "let the tool decide".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameRate(u32);

impl FrameRate {
    pub const NATIVE: FrameRate = FrameRate(0);

    pub fn new(fps: u32) -> Self {
        FrameRate(fps)
    }

    /// `None` when the tool default applies.
    pub fn explicit(&self) -> Option<u32> {
        match self.0 {
            0 => None,
            fps => Some(fps),
        }
    }

    pub fn or(&self, default: u32) -> u32 {
        self.explicit().unwrap_or(default)
    }
}

impl TryFrom<i64> for FrameRate {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(FrameRate)
            .map_err(|_| ValidationError::InvalidFrameRate(value))
    }
}

impl Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.explicit() {
            Some(fps) => write!(f, "{fps}"),
            None => write!(f, "native"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_has_no_explicit_rate() {
        assert_eq!(FrameRate::NATIVE.explicit(), None);
        assert_eq!(FrameRate::NATIVE.or(12), 12);
        assert_eq!(FrameRate::new(30).or(12), 30);
    }

    #[test]
    fn test_try_from() {
        assert_eq!(FrameRate::try_from(24).unwrap(), FrameRate::new(24));
        assert!(matches!(FrameRate::try_from(-1), Err(ValidationError::InvalidFrameRate(-1))));
        assert!(FrameRate::try_from(i64::MAX).is_err());
    }
}
