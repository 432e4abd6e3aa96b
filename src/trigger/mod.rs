mod hotkey;
mod prompt;

pub use hotkey::{HotkeyTrigger, KeyCombo};
pub use prompt::PromptTrigger;

use crate::result::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Create a GIF of what is currently playing
    MakeGif,
    /// Stop the program
    Quit,
}

/// A source of user requests driving the program.
///
/// Implementations block until the next request arrives.
pub trait CycleTrigger {
    fn next_event(&mut self) -> Result<Trigger>;
}
