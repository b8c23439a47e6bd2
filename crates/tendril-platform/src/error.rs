use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("could not encode value for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard is unavailable")]
    Unavailable,
    #[error("clipboard access was denied")]
    PermissionDenied,
    #[error("clipboard holds no text")]
    Empty,
    #[error("clipboard backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("position request timed out")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaQueryError {
    #[error("empty media query")]
    Empty,
    #[error("unknown media feature `{0}`")]
    UnknownFeature(String),
    #[error("bad value `{value}` for `{feature}`")]
    BadValue { feature: String, value: String },
    #[error("malformed media query near `{0}`")]
    Syntax(String),
}
