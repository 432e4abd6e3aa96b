mod clip_window;
mod media_source;
mod snapshot;

pub use clip_window::ClipWindow;
pub use media_source::MediaSource;
pub use snapshot::PlaybackSnapshot;
