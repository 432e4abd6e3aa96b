use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerKind {
    /// Ask on the console before every gif
    Prompt,
    /// Wait for key combinations pressed in the terminal
    Hotkey,
}

macro_rules! arg_env {
    ($v:literal) => {
        concat!("VLCGIF_", $v)
    };
}

/// Create GIFs from what VLC is currently playing.
/// Query the player, cut the clip, encode it with ffmpeg.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The path to the configuration file
    #[arg(long, default_value = "config.toml", env = arg_env!("CONFIG"))]
    pub config: PathBuf,

    /// How the creation of a gif is requested
    #[arg(long, value_enum, default_value_t = TriggerKind::Prompt, env = arg_env!("TRIGGER"))]
    pub trigger: TriggerKind,

    /// The number appended to the name of the first gif
    #[arg(long, default_value_t = 0, env = arg_env!("COUNTER_START"))]
    pub counter_start: u32,

    /// Log more details. Can be repeated
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::WARN,
            (false, 0) => tracing::Level::INFO,
            (false, 1) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        }
    }
}
