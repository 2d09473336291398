//! Error type shared by all constructs in the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DtcError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("config: missing key `{0}`")]
    MissingKey(String),

    #[error("config: key `{key}` should be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("npz write error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
}

pub type DtcResult<T> = Result<T, DtcError>;

impl DtcError {
    pub(crate) fn invalid<S>(name: &'static str, reason: S) -> Self
    where S: Into<String>
    {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}
