use std::{fmt::Display, path::PathBuf};

use miette::{miette, Result};

/// Where the encoder should read the media from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A file on the local filesystem.
    ///
    /// `percent_space` remembers whether the URI spelled spaces as `%20`,
    /// which is what decides if the path must be hidden behind a link.
    Local { path: PathBuf, percent_space: bool },

    /// Anything with a non-`file` scheme, handed to the encoder as-is
    Remote(String),
}

impl MediaSource {
    /// Build the media source from a playlist URI.
    ///
    /// `file` URIs lose their scheme and authority and are percent-decoded.
    /// Other schemes are kept verbatim. A string without any scheme is
    /// treated as an already local, maybe encoded, path.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(miette!("Empty media URI"));
        }

        let percent_space = uri.contains("%20");

        let Some((scheme, rest)) = split_scheme(uri) else {
            return Ok(Self::Local {
                path: bytes_to_path(percent_decode(uri))?,
                percent_space,
            });
        };

        if !scheme.eq_ignore_ascii_case("file") {
            return Ok(Self::Remote(uri.to_owned()));
        }

        // Skip the authority, usually empty or "localhost"
        let path = match rest.strip_prefix("//") {
            Some(after) => after.find('/').map_or("", |idx| &after[idx..]),
            None => rest,
        };
        if path.is_empty() {
            return Err(miette!("File URI '{uri}' has no path"));
        }

        let mut path = percent_decode(path);

        // "/C:/Videos" is a Windows drive path
        if is_drive_path(&path) {
            path.remove(0);
        }

        Ok(Self::Local {
            path: bytes_to_path(path)?,
            percent_space,
        })
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { path, .. } => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Percent-decode a string, e.g. `%20` to a space and `%5B` to `[`.
///
/// The player encodes the raw bytes of file names, which are not always UTF-8.
pub fn percent_decode(s: &str) -> Vec<u8> {
    urlencoding::decode_binary(s.as_bytes()).into_owned()
}

/// Unix paths are arbitrary bytes
#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> Result<PathBuf> {
    use std::{ffi::OsString, os::unix::ffi::OsStringExt};

    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: Vec<u8>) -> Result<PathBuf> {
    String::from_utf8(bytes)
        .map(PathBuf::from)
        .map_err(|err| miette!("Media path does not decode to valid UTF-8: {err}"))
}

/// Split `scheme:rest` following the URI scheme grammar:
/// a letter followed by letters, digits, `+`, `-` or `.`.
///
/// A single letter scheme is refused as it is a Windows drive letter.
fn split_scheme(uri: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = uri.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    (valid && scheme.len() > 1).then_some((scheme, rest))
}

fn is_drive_path(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(uri: &str) -> PathBuf {
        match MediaSource::from_uri(uri).unwrap() {
            MediaSource::Local { path, .. } => path,
            other => panic!("Expected a local source, got {other:?}"),
        }
    }

    #[test]
    fn file_uri_is_decoded() {
        assert_eq!(
            local("file:///home/me/Videos/My%20Show%20%5B1080p%5D.mkv"),
            PathBuf::from("/home/me/Videos/My Show [1080p].mkv")
        );
    }

    #[test]
    fn file_uri_authority_is_dropped() {
        assert_eq!(
            local("file://localhost/srv/media/a.mp4"),
            PathBuf::from("/srv/media/a.mp4")
        );
        assert_eq!(local("FILE:/srv/media/a.mp4"), PathBuf::from("/srv/media/a.mp4"));
    }

    #[test]
    fn windows_drive_loses_leading_slash() {
        assert_eq!(
            local("file:///C:/Users/me/clip%20one.avi"),
            PathBuf::from("C:/Users/me/clip one.avi")
        );
    }

    #[test]
    fn decoding_is_idempotent_on_decoded_paths() {
        let once = percent_decode("/a%20b/%5Bc%5D.mkv");
        assert_eq!(once, b"/a b/[c].mkv");
        let once = String::from_utf8(once).unwrap();
        assert_eq!(percent_decode(&once), once.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn latin1_file_names_are_kept_as_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let path = local("file:///videos/caf%E9.mkv");
        assert_eq!(path.as_os_str().as_bytes(), b"/videos/caf\xE9.mkv");
    }

    #[cfg(not(unix))]
    #[test]
    fn non_utf8_file_names_are_an_error() {
        assert!(MediaSource::from_uri("file:///C:/videos/caf%E9.mkv").is_err());
    }

    #[test]
    fn remembers_encoded_spaces() {
        let source = MediaSource::from_uri("file:///a%20b.mkv").unwrap();
        assert!(matches!(source, MediaSource::Local { percent_space: true, .. }));

        let source = MediaSource::from_uri("file:///a%5Bb%5D.mkv").unwrap();
        assert!(matches!(source, MediaSource::Local { percent_space: false, .. }));
    }

    #[test]
    fn other_schemes_are_remote() {
        let uri = "https://example.com/stream%20one.m3u8";
        assert_eq!(
            MediaSource::from_uri(uri).unwrap(),
            MediaSource::Remote(uri.to_owned())
        );
    }

    #[test]
    fn schemeless_strings_are_paths() {
        assert_eq!(local("/tmp/a%20b.mkv"), PathBuf::from("/tmp/a b.mkv"));
        assert_eq!(local("C:\\Videos\\a.mkv"), PathBuf::from("C:\\Videos\\a.mkv"));
    }

    #[test]
    fn empty_uri_is_an_error() {
        assert!(MediaSource::from_uri("  ").is_err());
        assert!(MediaSource::from_uri("file://host").is_err());
    }
}
