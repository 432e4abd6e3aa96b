mod cli;
mod config;
mod driver;
mod io;
mod logging;
mod maker;
mod media_link;
mod outside;
mod result;
mod trigger;
mod types;

use clap::Parser;
use miette::Context;
use tracing::{debug, info};

use crate::{
    cli::{Args, TriggerKind},
    config::Settings,
    io::create_output_dir,
    logging::init_logging,
    maker::GifMaker,
    outside::{Ffmpeg, Vlc},
    result::Result,
    trigger::{CycleTrigger, HotkeyTrigger, KeyCombo, PromptTrigger},
};

fn main() -> miette::Result<()> {
    // Initialize the environment & CLI
    let args = Args::parse();
    init_logging(args.log_level())?;

    let settings = Settings::load(&args.config)?;
    debug!("Settings: {settings:?}");

    // Make sure the output directory is created
    create_output_dir(&settings.gif.output_path)?;

    let (player, encoder) = load_external_components(&settings)?;
    let mut maker = GifMaker::new(
        &player,
        &encoder,
        &settings.gif,
        settings.cropping.resize,
        args.counter_start,
    );

    let mut trigger = load_trigger(args.trigger, &settings)?;

    info!(
        "Gifs will be written to {}",
        settings.gif.output_path.display()
    );
    driver::run(trigger.as_mut(), &mut maker)?;

    Ok(())
}

/// Load the external components
fn load_external_components(settings: &Settings) -> Result<(Vlc, Ffmpeg)> {
    let vlc = Vlc::new(settings.credentials.clone(), settings.server.clone())?;
    let ffmpeg = Ffmpeg::new()?;

    Ok((vlc, ffmpeg))
}

fn load_trigger(kind: TriggerKind, settings: &Settings) -> miette::Result<Box<dyn CycleTrigger>> {
    let trigger: Box<dyn CycleTrigger> = match kind {
        TriggerKind::Prompt => Box::new(PromptTrigger::new(
            std::io::stdin().lock(),
            std::io::stdout(),
        )),
        TriggerKind::Hotkey => {
            let make = settings
                .hotkey
                .make
                .parse::<KeyCombo>()
                .wrap_err("Invalid hotkey.make")?;
            let quit = settings
                .hotkey
                .quit
                .parse::<KeyCombo>()
                .wrap_err("Invalid hotkey.quit")?;
            Box::new(HotkeyTrigger::new(make, quit)?)
        }
    };

    Ok(trigger)
}
