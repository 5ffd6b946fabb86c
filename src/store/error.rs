use std::path::PathBuf;
use thiserror::Error;

use super::format::ParseError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("property file not found: {0}")]
    NotFound(PathBuf),

    #[error("property source is a directory: {0}")]
    IsDirectory(PathBuf),

    #[error("failed to read property file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse property file '{path}': {source}")]
    Parse { path: PathBuf, source: ParseError },

    #[error("failed to parse TOML file '{path}': {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("value at '{key}' in '{path}' cannot be flattened to a property")]
    UnsupportedValue { path: PathBuf, key: String },
}
