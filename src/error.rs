use crate::bind::BindError;
use crate::store::LoadError;
use thiserror::Error;

/// Top-level error type for the dragon-props library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("binding error: {0}")]
    Bind(#[from] BindError),

    #[error("property source error: {0}")]
    Load(#[from] LoadError),
}
