use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use miette::{Context, IntoDiagnostic};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{result::Result, types::MediaSource};

/// Characters that the encoder has trouble with in input paths
const SPECIAL_CHARS: [char; 3] = [' ', '[', ']'];

/// A symbolic link to a media file, with a name free of special characters.
///
/// The link lives in its own temporary directory, so concurrent links never collide.
/// Both are removed when this handle is dropped.
#[derive(Debug)]
pub struct MediaLink {
    _dir: TempDir,
    link: PathBuf,
}

impl MediaLink {
    /// Create a link named `media<counter>` with the target extension.
    ///
    /// Return None when the system does not let us create symbolic links,
    /// e.g. Windows without developer mode.
    pub fn create(target: &Path, counter: u32) -> Result<Option<Self>> {
        let dir = tempfile::Builder::new()
            .prefix("vlc-gif-")
            .tempdir()
            .into_diagnostic()
            .wrap_err("Could not create a temporary directory for the media link")?;

        let mut name = format!("media{counter}");
        if let Some(ext) = target.extension().and_then(OsStr::to_str) {
            name.push('.');
            name.push_str(&ext.replace(SPECIAL_CHARS, "_"));
        }
        let link = dir.path().join(name);

        let linked = allow_denied(symlink(target, &link))
            .into_diagnostic()
            .wrap_err_with(|| {
                format!(
                    "Could not link {} to {}",
                    link.display(),
                    target.display()
                )
            })?;
        if !linked {
            warn!(
                "Not allowed to create symbolic links, using {} as is",
                target.display()
            );
            return Ok(None);
        }
        debug!("Linked {} to {}", link.display(), target.display());

        Ok(Some(Self { _dir: dir, link }))
    }

    pub fn path(&self) -> &Path {
        &self.link
    }
}

/// Whether the media must be accessed through a [`MediaLink`]
pub fn needs_link(source: &MediaSource) -> bool {
    match source {
        MediaSource::Local {
            path,
            percent_space,
        } => *percent_space || path.to_string_lossy().contains(SPECIAL_CHARS),
        MediaSource::Remote(_) => false,
    }
}

/// Run `f` with a path to the media that is safe to hand to the encoder.
///
/// When a link is needed, it is removed after `f` returns, whatever its result.
pub fn with_safe_path<T, F>(source: &MediaSource, counter: u32, f: F) -> Result<T>
where
    F: FnOnce(&OsStr) -> Result<T>,
{
    match source {
        MediaSource::Local { path, .. } if needs_link(source) => {
            match MediaLink::create(path, counter)? {
                Some(link) => f(link.path().as_os_str()),
                None => f(path.as_os_str()),
            }
        }
        MediaSource::Local { path, .. } => f(path.as_os_str()),
        MediaSource::Remote(url) => f(OsStr::new(url)),
    }
}

/// Windows `ERROR_PRIVILEGE_NOT_HELD`
const PRIVILEGE_NOT_HELD: i32 = 1314;

/// `Ok(false)` when the link was refused for lack of privileges
fn allow_denied(res: io::Result<()>) -> io::Result<bool> {
    match res {
        Ok(()) => Ok(true),
        Err(err)
            if err.kind() == io::ErrorKind::PermissionDenied
                || (cfg!(windows) && err.raw_os_error() == Some(PRIVILEGE_NOT_HELD)) =>
        {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
