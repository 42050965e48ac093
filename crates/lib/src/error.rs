use std::path::PathBuf;

use thiserror::Error;

use crate::variant::VariantError;

/// Errors from any stage of the save-and-copy flow
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("cannot connect to session bus: {0}")]
    Connection(#[source] zbus::Error),
    #[error("portal call failed: {0}")]
    Transport(#[from] zbus::Error),
    #[error("{0}")]
    Protocol(String),
    #[error("malformed response: {0}")]
    Decode(#[from] VariantError),
    #[error("no `{0}` in response results")]
    MissingKey(&'static str),
    #[error("expected exactly 1 uri, got {0}")]
    Cardinality(usize),
    #[error("invalid uri {uri:?}: {reason}")]
    UriParse { uri: String, reason: String },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("interrupted while waiting for the portal")]
    Interrupted,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
