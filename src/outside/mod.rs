mod command;
mod ffmpeg;
mod vlc;

pub use ffmpeg::{Ffmpeg, GifEncoder, GifOptions};
pub use vlc::{MediaPlayer, Vlc};
