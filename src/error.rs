//! Errors produced while creating the managed directory layout.

use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required directory is occupied by some other filesystem object.
    #[error("couldn't create the directory \"{path}\" - it already exists and is not a directory")]
    NotADirectory { path: Utf8PathBuf },

    /// Stat or mkdir failed; the underlying error is passed through untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_a_directory(path: impl Into<Utf8PathBuf>) -> Self {
        Self::NotADirectory { path: path.into() }
    }
}
