use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use config::{Config, Environment, File, FileFormat};
use miette::{bail, Context, IntoDiagnostic, Result};
use serde::Deserialize;

/// Prefix of the environment variables overriding the configuration file.
/// Sections and keys are separated by a double underscore,
/// e.g. `VLCGIF_CREDENTIALS__PASSWORD`.
const ENV_PREFIX: &str = "VLCGIF";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub credentials: Credentials,
    pub server: Server,
    pub cropping: Cropping,
    pub gif: GifSettings,
    #[serde(default)]
    pub hotkey: HotkeySettings,
}

/// Basic authentication for the player HTTP interface.
/// VLC only asks for a password, the user is usually left empty.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// URL of the status endpoint, e.g. `http://127.0.0.1:8080/requests/status.xml`
    pub status: String,
    /// URL of the playlist endpoint, e.g. `http://127.0.0.1:8080/requests/playlist.xml`
    pub playlist: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cropping {
    /// Scale factor applied to the video dimensions
    pub resize: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GifSettings {
    /// Duration of the clip, in seconds
    pub length: u64,
    /// Base name of the output files, the counter is appended to it
    pub name: String,
    pub output_path: PathBuf,
    pub fps: Option<f64>,
    #[serde(default)]
    pub credits: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotkeySettings {
    #[serde(default = "default_make_key")]
    pub make: String,
    #[serde(default = "default_quit_key")]
    pub quit: String,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            make: default_make_key(),
            quit: default_quit_key(),
        }
    }
}

fn default_make_key() -> String {
    "ctrl+alt+g".to_owned()
}

fn default_quit_key() -> String {
    "ctrl+alt+q".to_owned()
}

impl Settings {
    /// Load the settings from the TOML file, overridden by the environment
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read config file {}", path.display()))?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(self.cropping.resize > 0.0) {
            bail!("cropping.resize must be positive, got {}", self.cropping.resize);
        }
        if self.gif.length == 0 {
            bail!("gif.length must be at least 1 second");
        }
        if let Some(fps) = self.gif.fps {
            if !(fps > 0.0) {
                bail!("gif.fps must be positive, got {fps}");
            }
        }
        if self.gif.name.contains(['/', '\\']) {
            bail!("gif.name must not contain a path separator");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;

    use super::*;

    const FULL: &str = indoc! {r#"
        [credentials]
        user = ""
        password = "hunter2"

        [server]
        status = "http://127.0.0.1:8080/requests/status.xml"
        playlist = "http://127.0.0.1:8080/requests/playlist.xml"

        [cropping]
        resize = 0.5

        [gif]
        length = 3
        name = "clip"
        output_path = "gifs"
        fps = 10
    "#};

    fn load_str(content: &str) -> Result<Settings> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        Settings::load(file.path())
    }

    #[test]
    fn load_full_config() {
        let settings = load_str(FULL).unwrap();
        assert_eq!(settings.credentials.password, "hunter2");
        assert_eq!(settings.cropping.resize, 0.5);
        assert_eq!(settings.gif.length, 3);
        assert_eq!(settings.gif.name, "clip");
        assert_eq!(settings.gif.output_path, PathBuf::from("gifs"));
        assert_eq!(settings.gif.fps, Some(10.0));
        assert!(!settings.gif.credits);
        assert_eq!(settings.hotkey.make, "ctrl+alt+g");
        assert_eq!(settings.hotkey.quit, "ctrl+alt+q");
    }

    #[test]
    fn fps_is_optional() {
        let settings = load_str(&FULL.replace("fps = 10\n", "")).unwrap();
        assert_eq!(settings.gif.fps, None);
    }

    #[test]
    fn missing_key_is_an_error() {
        let content = FULL.replace("password = \"hunter2\"\n", "");
        assert!(load_str(&content).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::load(Path::new("/nonexistent/vlc-gif.toml")).is_err());
    }

    #[test]
    fn reject_invalid_values() {
        assert!(load_str(&FULL.replace("resize = 0.5", "resize = 0")).is_err());
        assert!(load_str(&FULL.replace("length = 3", "length = 0")).is_err());
        assert!(load_str(&FULL.replace("fps = 10", "fps = -1")).is_err());
        assert!(load_str(&FULL.replace("name = \"clip\"", "name = \"a/b\"")).is_err());
    }
}
