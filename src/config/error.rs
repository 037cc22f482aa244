//! Configuration errors.
//!
//! All errors produced by the config module (validation and env loading) use [`ConfigError`].

use std::fmt;

/// Errors produced when building or validating configuration.
///
/// # Variants
///
/// - **Validation**: values are inconsistent or out of range (e.g. `n_embed` not divisible by `n_head`).
///   *When*: [`Config::validate`](super::Config::validate), which model construction calls.
///   *Recovery*: fix the value named in the message.
///
/// - **EnvVar**: an environment variable could not be read (e.g. invalid Unicode).
///
/// - **Parse**: an environment variable was set but could not be parsed (e.g. `MICROGPT_SEED=abc`).
///   *Recovery*: set a valid value or unset it to use the default.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration validation failed.
    Validation(String),

    /// Failed to read an environment variable.
    EnvVar {
        /// The full environment variable name that was read.
        key: String,
        /// Underlying cause (e.g. NotUnicode).
        message: String,
    },

    /// Environment variable was set but could not be parsed into the expected type.
    Parse {
        /// The full environment variable name.
        key: String,
        /// The raw value that failed to parse.
        value: String,
        /// Human-readable parse reason.
        message: String,
    },
}

impl ConfigError {
    /// Returns a short message suitable for logging.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ConfigError::Validation(m) => m,
            ConfigError::EnvVar { message, .. } | ConfigError::Parse { message, .. } => message,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Validation(m) => write!(f, "config validation: {m}"),
            ConfigError::EnvVar { key, message } => write!(f, "env var {key}: {message}"),
            ConfigError::Parse {
                key,
                value,
                message,
            } => write!(f, "env var {key}={value:?}: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
