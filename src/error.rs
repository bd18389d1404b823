//! Error types for the notification shade

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("setting {key} expects {expected}, got {value:?}")]
    BadValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, Error>;
