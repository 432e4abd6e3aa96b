use std::{fs::OpenOptions, io::Write, path::Path};

use miette::{Context, IntoDiagnostic};

use crate::result::Result;

/// Appended after the GIF trailer, ignored by decoders
pub const CREDITS: &str = "Made with vlc-gif";

/// Create the output directory and its parents if they do not exist
pub fn create_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create output directory {}", path.display()))?;
    Ok(())
}

pub fn append_credits(path: &Path) -> Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(CREDITS.as_bytes())?;
    Ok(())
}

/// Size of the file in bytes, or 0 if it does not exist
pub fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map_or(0, |meta| meta.len())
}
