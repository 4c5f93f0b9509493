use reqwest::StatusCode;
use std::path::PathBuf;

/// Errors surfaced by the StatBank client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-domain caller input (language, subject id, table id, selection).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Non-success HTTP status. `reason` is the server's message when it sent one,
    /// otherwise the canonical reason phrase of the status.
    #[error("HTTP {status}: {reason} (url: {url})")]
    Http {
        status: StatusCode,
        reason: String,
        url: String,
    },

    /// Local file output failed (missing directory, permission, disk full…).
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reading the response body failed mid-download.
    #[error("download interrupted: {0}")]
    Download(#[source] std::io::Error),

    #[error("json decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv decode error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Human-readable failure reason of an upstream error, `None` for other kinds.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::Http { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// HTTP status of an upstream error, `None` for other kinds.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
