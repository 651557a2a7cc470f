//! Errors when loading data from disk.
//!
//! The processing stages themselves never fail. Features that cannot be
//! drawn or labelled are skipped.

use std::io;
use std::path::{Path, PathBuf};


//------------ Error ---------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Error {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn parse(path: &Path, source: toml::de::Error) -> Self {
        Error::Parse { path: path.into(), source }
    }
}
