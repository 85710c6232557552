//! Configuration and I/O errors shared across crates

use thiserror::Error;

/// Startup-time error: bad or missing settings, unreadable files.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("missing required setting `{setting}` (set {env_var} or add it to the config file)")]
    MissingSetting {
        setting: &'static str,
        env_var: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
