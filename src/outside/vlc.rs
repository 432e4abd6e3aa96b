use std::{fmt::Debug, time::Duration};

use indoc::indoc;
use miette::{miette, Context, IntoDiagnostic};
use reqwest::blocking::Client;
use roxmltree::{Document, ParsingOptions};
use tracing::debug;

use crate::{
    config::{Credentials, Server},
    result::{Error, Result},
    types::{MediaSource, PlaybackSnapshot},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const UNREACHABLE_HELP: &str = indoc! {"
    Is VLC running with its Lua HTTP interface enabled?
    Enable it in Preferences > All > Interface > Main interfaces (check \"Web\"),
    set a password in Main interfaces > Lua, then restart VLC.
"};

/// Interface for querying what a media player is currently playing
pub trait MediaPlayer: Debug {
    /// Get the current playback position and, if known, the active file name
    fn status(&self) -> Result<PlaybackSnapshot>;

    /// Find where the playing media is stored.
    ///
    /// The file name reported by [`MediaPlayer::status`] is used to find the entry
    /// if the player does not flag the current one.
    fn media_source(&self, filename: Option<&str>) -> Result<MediaSource>;
}

/// Interface for the [VLC](https://www.videolan.org/vlc/) HTTP interface.
///
/// Holds a single HTTP client reused for every request.
#[derive(Debug)]
pub struct Vlc {
    client: Client,
    credentials: Credentials,
    server: Server,
}

impl Vlc {
    pub fn new(credentials: Credentials, server: Server) -> Result<Self> {
        // The player is expected on the local network
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()
            .into_diagnostic()
            .wrap_err("Could not create the HTTP client")?;

        Ok(Self {
            client,
            credentials,
            server,
        })
    }

    /// POST an empty request to the endpoint and return the response body
    fn post(&self, url: &str) -> Result<String> {
        debug!("POST {url}");

        let res = self
            .client
            .post(url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .map_err(|err| {
                if err.is_connect() || err.is_timeout() {
                    Error::PlayerUnreachable(miette!(
                        help = UNREACHABLE_HELP,
                        "Could not connect to the player at {url}: {err}"
                    ))
                } else {
                    Error::Miette(miette!("Request to {url} failed: {err}"))
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            let hint = if status == reqwest::StatusCode::UNAUTHORIZED {
                " Check the credentials in the configuration"
            } else {
                ""
            };
            return Err(Error::Miette(miette!(
                "Player answered {status} to {url}.{hint}"
            )));
        }

        Ok(res
            .text()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read the response of {url}"))?)
    }
}

impl MediaPlayer for Vlc {
    fn status(&self) -> Result<PlaybackSnapshot> {
        let body = self.post(&self.server.status)?;
        parse_status(&body).map_err(|err| err.wrap_err_with(|| "Unexpected status response"))
    }

    fn media_source(&self, filename: Option<&str>) -> Result<MediaSource> {
        let body = self.post(&self.server.playlist)?;
        let uri = parse_playlist(&body, filename)
            .map_err(|err| err.wrap_err_with(|| "Unexpected playlist response"))?;
        debug!("Media URI: {uri}");

        Ok(MediaSource::from_uri(&uri)?)
    }
}

fn parse_xml(xml: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };

    Ok(Document::parse_with_options(xml, options)
        .into_diagnostic()
        .wrap_err("Response is not valid XML")?)
}

/// Extract the playback time and the file name from the status document
fn parse_status(xml: &str) -> Result<PlaybackSnapshot> {
    let doc = parse_xml(xml)?;

    let time = doc
        .descendants()
        .find(|n| n.has_tag_name("time"))
        .and_then(|n| n.text())
        .map(str::trim)
        .ok_or_else(|| miette!("No 'time' element found"))?;
    let time = parse_seconds(time)?;

    let filename = doc
        .descendants()
        .find(|n| n.has_tag_name("info") && n.attribute("name") == Some("filename"))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());

    Ok(PlaybackSnapshot { time, filename })
}

fn parse_seconds(time: &str) -> Result<u64> {
    if let Ok(secs) = time.parse::<u64>() {
        return Ok(secs);
    }

    match time.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 && secs < u64::MAX as f64 => Ok(secs as u64),
        _ => Err(miette!("Invalid playback time '{time}'").into()),
    }
}

/// Find the URI of the playing entry in the playlist document.
///
/// An entry flagged as current wins, otherwise the first one named `filename`.
fn parse_playlist(xml: &str, filename: Option<&str>) -> Result<String> {
    let doc = parse_xml(xml)?;

    let leaves = || doc.descendants().filter(|n| n.has_tag_name("leaf"));
    let leaf = leaves()
        .find(|n| n.attribute("current").is_some())
        .or_else(|| filename.and_then(|name| leaves().find(|n| n.attribute("name") == Some(name))));

    let leaf = leaf.ok_or_else(|| match filename {
        Some(name) => miette!("No playlist entry is playing or named '{name}'"),
        None => miette!("No playlist entry is playing"),
    })?;

    leaf.attribute("uri")
        .map(str::to_owned)
        .ok_or_else(|| miette!("Playlist entry has no 'uri' attribute").into())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const STATUS: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8" standalone="yes" ?>
        <root>
          <fullscreen>false</fullscreen>
          <time>83</time>
          <length>1421</length>
          <state>playing</state>
          <information>
            <category name="meta">
              <info name="title">Some Show</info>
              <info name="filename">Some Show [1080p].mkv</info>
            </category>
          </information>
        </root>
    "#};

    const PLAYLIST: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8" standalone="yes" ?>
        <node ro="rw" name="Undefined" id="0">
          <node ro="ro" name="Playlist" id="1">
            <leaf ro="rw" name="Other.mkv" id="4" duration="60" uri="file:///videos/Other.mkv"/>
            <leaf ro="rw" name="Some Show [1080p].mkv" id="5" duration="1421"
                  uri="file:///videos/Some%20Show%20%5B1080p%5D.mkv"/>
          </node>
          <node ro="ro" name="Media Library" id="2"/>
        </node>
    "#};

    #[test]
    fn status_time_and_filename() {
        let snapshot = parse_status(STATUS).unwrap();
        assert_eq!(snapshot.time, 83);
        assert_eq!(snapshot.filename.as_deref(), Some("Some Show [1080p].mkv"));
    }

    #[test]
    fn status_without_filename() {
        let snapshot = parse_status("<root><time> 12 </time></root>").unwrap();
        assert_eq!(
            snapshot,
            PlaybackSnapshot {
                time: 12,
                filename: None
            }
        );
    }

    #[test]
    fn status_fractional_time() {
        assert_eq!(parse_status("<root><time>12.9</time></root>").unwrap().time, 12);
    }

    #[test]
    fn status_errors() {
        assert!(parse_status("<root><state>stopped</state></root>").is_err());
        assert!(parse_status("<root><time>-3</time></root>").is_err());
        assert!(parse_status("<root><time>soon</time></root>").is_err());
        assert!(parse_status("<root><time>inf</time></root>").is_err());
        assert!(parse_status("<root><time>NaN</time></root>").is_err());
        assert!(parse_status("<root><time>1e300</time></root>").is_err());
        assert!(parse_status("<html>not closed").is_err());
    }

    #[test]
    fn playlist_by_filename() {
        let uri = parse_playlist(PLAYLIST, Some("Some Show [1080p].mkv")).unwrap();
        assert_eq!(uri, "file:///videos/Some%20Show%20%5B1080p%5D.mkv");

        match MediaSource::from_uri(&uri).unwrap() {
            MediaSource::Local { path, percent_space } => {
                assert_eq!(path, PathBuf::from("/videos/Some Show [1080p].mkv"));
                assert!(percent_space);
            }
            other => panic!("Expected a local source, got {other:?}"),
        }
    }

    #[test]
    fn playlist_current_flag_wins() {
        let xml = PLAYLIST.replace(r#"id="4""#, r#"id="4" current="current""#);
        let uri = parse_playlist(&xml, Some("Some Show [1080p].mkv")).unwrap();
        assert_eq!(uri, "file:///videos/Other.mkv");
    }

    #[test]
    fn playlist_errors() {
        assert!(parse_playlist(PLAYLIST, Some("Missing.mkv")).is_err());
        assert!(parse_playlist(PLAYLIST, None).is_err());
        assert!(parse_playlist(r#"<node><leaf name="a" current="current"/></node>"#, None).is_err());
    }

    #[test]
    fn unreachable_player() {
        let vlc = Vlc::new(
            Credentials {
                user: String::new(),
                password: "pass".to_owned(),
            },
            Server {
                // Port 1 is reserved (tcpmux) and never listened on in practice
                status: "http://127.0.0.1:1/requests/status.xml".to_owned(),
                playlist: "http://127.0.0.1:1/requests/playlist.xml".to_owned(),
            },
        )
        .unwrap();

        assert!(matches!(vlc.status(), Err(Error::PlayerUnreachable(_))));
    }
}
