use std::fmt::Display;

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// The player HTTP interface could not be reached at all.
    /// This ends the program as no cycle can succeed without it.
    PlayerUnreachable(miette::Report),

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette::Report::from_err(err))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::PlayerUnreachable(err) | Error::Miette(err) => err,
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Create an error from a simple message
pub fn err_msg<D: Display>(msg: D) -> Error {
    Error::Miette(miette!("{msg}"))
}

/// Return early with an error built from a simple message
pub fn bail<T, D: Display>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}
