use std::{ffi::OsStr, fmt::Debug, path::Path};

use miette::{Context, IntoDiagnostic};
use serde::Deserialize;

use crate::{
    result::{err_msg, Result},
    types::ClipWindow,
};

use super::command::{
    assert_success_command, run_command, Capture, FFMPEG, FFPROBE, FFXXX_DEFAULT_ARGS,
};

/// How the clip should look once turned into a GIF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GifOptions {
    /// Scale factor applied to both dimensions
    pub resize: f64,
    /// Output frame rate. Keep the source frame rate if not specified
    pub fps: Option<f64>,
}

pub trait GifEncoder: Debug {
    /// Return the duration of the media in seconds,
    /// or None if the container does not know it (e.g. live streams).
    fn probe_duration(&self, input: &OsStr) -> Result<Option<f64>>;

    /// Cut the window out of the input media and write it as a looping GIF.
    /// An existing output file is overwritten.
    fn encode_gif(
        &self,
        input: &OsStr,
        output: &Path,
        window: ClipWindow,
        options: GifOptions,
    ) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) programs
#[derive(Debug)]
pub struct Ffmpeg;

impl Ffmpeg {
    /// Verify that the `ffmpeg` and `ffprobe` binaries are reachable
    pub fn new() -> Result<Self> {
        assert_success_command(FFMPEG, |cmd| cmd.arg("-version"))?;
        assert_success_command(FFPROBE, |cmd| cmd.arg("-version"))?;

        Ok(Self)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl GifEncoder for Ffmpeg {
    fn probe_duration(&self, input: &OsStr) -> Result<Option<f64>> {
        let res = run_command(
            FFPROBE,
            |cmd| {
                cmd.args(FFXXX_DEFAULT_ARGS)
                    .args(["-show_entries", "format=duration"])
                    .args(["-of", "json"])
                    .arg(input)
            },
            Capture::STDOUT | Capture::STDERR,
        )?;

        if !res.status.success() {
            let stderr = String::from_utf8_lossy(&res.stderr);
            return Err(err_msg(format!(
                "ffprobe could not read the media: {}",
                stderr.trim()
            )));
        }

        parse_probe_duration(&String::from_utf8_lossy(&res.stdout))
    }

    fn encode_gif(
        &self,
        input: &OsStr,
        output: &Path,
        window: ClipWindow,
        options: GifOptions,
    ) -> Result<()> {
        let filter = gif_filter(options);

        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                // Seeking before the input is fast and accurate when transcoding
                .args(["-ss", &window.start.to_string()])
                .args(["-t", &window.length.to_string()])
                .args([OsStr::new("-i"), input])
                .args(["-vf", &filter])
                .arg("-an")
                .args(["-loop", "0"])
                .args(["-f", "gif"])
                .arg(output)
        })
    }
}

fn parse_probe_duration(output: &str) -> Result<Option<f64>> {
    let probe: ProbeOutput = serde_json::from_str(output)
        .into_diagnostic()
        .wrap_err("Could not parse ffprobe JSON output")?;

    match probe.format.duration.as_deref() {
        None | Some("N/A") => Ok(None),
        Some(duration) => Ok(Some(
            duration
                .parse()
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid media duration '{duration}'"))?,
        )),
    }
}

/// Build the video filter: lower the frame rate, resize,
/// then generate a palette from the clip itself for better colors
fn gif_filter(options: GifOptions) -> String {
    let mut filter = String::new();
    if let Some(fps) = options.fps {
        filter.push_str(&format!("fps={fps},"));
    }
    filter.push_str(&format!(
        "scale=iw*{}:-1:flags=lanczos,split[a][b];[a]palettegen[p];[b][p]paletteuse",
        options.resize
    ));
    filter
}
