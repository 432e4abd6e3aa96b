use tracing::{error, info};

use crate::{
    maker::GifMaker,
    result::{Error, Result},
    trigger::{CycleTrigger, Trigger},
};

/// Run a cycle every time the trigger asks for one, until it asks to quit.
///
/// A cycle failure is logged and the next request is awaited,
/// unless the player cannot be reached at all, which stops the loop.
pub fn run(trigger: &mut dyn CycleTrigger, maker: &mut GifMaker) -> Result<()> {
    loop {
        match trigger.next_event()? {
            Trigger::Quit => {
                info!("Bye.");
                return Ok(());
            }
            Trigger::MakeGif => {
                info!("Making gif {}...", maker.counter());
                match maker.make_gif() {
                    Ok(path) => info!("Gif written to {}", path.display()),
                    Err(err @ Error::PlayerUnreachable(_)) => return Err(err),
                    Err(Error::Miette(report)) => error!("{report:?}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{
        maker::tests::{gif_settings, FakeEncoder, FakePlayer},
        trigger::PromptTrigger,
    };

    use super::*;

    fn prompt(input: &str) -> PromptTrigger<Cursor<String>, Vec<u8>> {
        PromptTrigger::new(Cursor::new(input.to_owned()), Vec::new())
    }

    fn player() -> FakePlayer {
        FakePlayer {
            time: 5,
            uri: "file:///videos/clip.mkv".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn quit_without_encoding() {
        let out = tempfile::tempdir().unwrap();
        let player = player();
        let encoder = FakeEncoder::default();
        let settings = gif_settings(out.path());
        let mut maker = GifMaker::new(&player, &encoder, &settings, 1.0, 0);

        run(&mut prompt("q\n"), &mut maker).unwrap();
        assert_eq!(player.status_calls.get(), 0);
        assert!(encoder.calls.borrow().is_empty());
    }

    #[test]
    fn one_gif_per_yes() {
        let out = tempfile::tempdir().unwrap();
        let player = player();
        let encoder = FakeEncoder {
            duration: Some(60.0),
            ..Default::default()
        };
        let settings = gif_settings(out.path());
        let mut maker = GifMaker::new(&player, &encoder, &settings, 1.0, 0);

        run(&mut prompt("y\nnope\ny\nq\n"), &mut maker).unwrap();
        assert_eq!(maker.counter(), 2);
        assert!(out.path().join("clip0.gif").exists());
        assert!(out.path().join("clip1.gif").exists());
        assert!(!out.path().join("clip2.gif").exists());
    }

    #[test]
    fn failed_cycle_does_not_stop_the_loop() {
        let out = tempfile::tempdir().unwrap();
        let player = player();
        let encoder = FakeEncoder {
            duration: Some(60.0),
            write_nothing: true,
            ..Default::default()
        };
        let settings = gif_settings(out.path());
        let mut maker = GifMaker::new(&player, &encoder, &settings, 1.0, 0);

        run(&mut prompt("y\ny\nq\n"), &mut maker).unwrap();
        assert_eq!(encoder.calls.borrow().len(), 2);
        assert_eq!(maker.counter(), 0);
    }

    #[test]
    fn unreachable_player_stops_the_loop() {
        let out = tempfile::tempdir().unwrap();
        let player = FakePlayer {
            unreachable: true,
            ..Default::default()
        };
        let encoder = FakeEncoder::default();
        let settings = gif_settings(out.path());
        let mut maker = GifMaker::new(&player, &encoder, &settings, 1.0, 0);

        let res = run(&mut prompt("y\ny\nq\n"), &mut maker);
        assert!(matches!(res, Err(Error::PlayerUnreachable(_))));
        assert_eq!(player.status_calls.get(), 1);
        assert_eq!(player.playlist_calls.get(), 0);
    }
}
