use std::fmt::Display;

/// The `[start, start + length]` range to cut from the source media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub start: u64,
    pub length: u64,
}

impl ClipWindow {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Shorten the window so that it does not go past `duration`.
    /// Return None if the window starts at or after `duration`.
    pub fn clamp_to(self, duration: u64) -> Option<Self> {
        if self.start >= duration {
            None
        } else {
            Some(Self {
                start: self.start,
                length: self.length.min(duration - self.start),
            })
        }
    }

    pub fn to_hms(secs: u64) -> String {
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

impl Display for ClipWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            Self::to_hms(self.start),
            Self::to_hms(self.end())
        )
    }
}
