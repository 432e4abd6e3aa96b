use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::{
    config::GifSettings,
    io::{append_credits, file_len},
    media_link::with_safe_path,
    outside::{GifEncoder, GifOptions, MediaPlayer},
    result::{err_msg, Result},
    types::ClipWindow,
};

/// Everything needed to turn the current playback into a GIF.
///
/// Owns the output counter, which is only incremented after a successful cycle.
#[derive(Debug)]
pub struct GifMaker<'a> {
    player: &'a dyn MediaPlayer,
    encoder: &'a dyn GifEncoder,
    settings: &'a GifSettings,
    resize: f64,
    counter: u32,
}

impl<'a> GifMaker<'a> {
    pub fn new(
        player: &'a dyn MediaPlayer,
        encoder: &'a dyn GifEncoder,
        settings: &'a GifSettings,
        resize: f64,
        counter: u32,
    ) -> Self {
        Self {
            player,
            encoder,
            settings,
            resize,
            counter,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// The file the next GIF will be written to: `<output_path>/<name><counter>.gif`
    pub fn output_path(&self) -> PathBuf {
        self.settings
            .output_path
            .join(format!("{}{}.gif", self.settings.name, self.counter))
    }

    /// Run one full cycle and return the path of the created GIF
    pub fn make_gif(&mut self) -> Result<PathBuf> {
        let snapshot = self.player.status()?;
        debug!("Playback snapshot: {snapshot:?}");

        let source = self.player.media_source(snapshot.filename.as_deref())?;
        info!("Clipping {source} at {}", ClipWindow::to_hms(snapshot.time));

        let output = self.output_path();
        let window = ClipWindow::new(snapshot.time, self.settings.length);
        let options = GifOptions {
            resize: self.resize,
            fps: self.settings.fps,
        };

        with_safe_path(&source, self.counter, |input| {
            let window = match self.encoder.probe_duration(input)? {
                Some(duration) => {
                    let clamped = window.clamp_to(duration.ceil() as u64).ok_or_else(|| {
                        err_msg(format!(
                            "Clip start {} is past the end of the media ({})",
                            ClipWindow::to_hms(window.start),
                            ClipWindow::to_hms(duration as u64)
                        ))
                    })?;
                    if clamped != window {
                        warn!("Clip shortened to {clamped} as the media ends before {window}");
                    }
                    clamped
                }
                None => window,
            };

            debug!("Encoding {window} to {}", output.display());
            self.encoder.encode_gif(input, &output, window, options)
        })
        .map_err(|err| err.wrap_err_with(|| "Could not create the GIF"))?;

        if file_len(&output) == 0 {
            return Err(err_msg(format!(
                "The encoder did not write anything to {}",
                output.display()
            )));
        }

        if self.settings.credits {
            append_credits(&output)?;
        }

        self.counter += 1;
        Ok(output)
    }
}
