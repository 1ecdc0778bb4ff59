//! Error handling for realm settings.

use thiserror::Error;

/// Result type alias using the realm settings error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading realm settings.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings are structurally valid but unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Settings file could not be parsed.
    #[error("settings parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings file could not be read.
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns whether the settings source itself was unreadable.
    #[must_use]
    pub const fn is_source_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Io(_))
    }
}
