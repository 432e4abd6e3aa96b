/// What the player reported at the instant it was queried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Elapsed playback time, in seconds
    pub time: u64,

    /// Name of the active file, if the player reported one
    pub filename: Option<String>,
}
