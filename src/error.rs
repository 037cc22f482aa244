//! Crate-level error wrapping the per-module errors.

use std::fmt;

use crate::config::ConfigError;
use crate::data::DataError;
use crate::tokenizer::TokenizerError;

/// Errors returned by model construction, training, tracing, and generation.
///
/// Every variant is raised before any state is modified, so a failed call
/// leaves the [`ModelState`](crate::ModelState) as it was.
#[derive(Debug)]
pub enum EngineError {
    /// Invalid configuration.
    Config(ConfigError),
    /// Invalid or unreadable corpus.
    Data(DataError),
    /// Text could not be tokenized.
    Tokenizer(TokenizerError),
    /// Sampling temperature is not a finite value above 0.
    InvalidTemperature(f64),
    /// The learning-rate decay horizon is 0 steps.
    InvalidTargetSteps,
    /// Token id outside `[0, vocab_size)`.
    TokenOutOfRange {
        /// Offending id.
        id: usize,
        /// Vocabulary size.
        vocab_size: usize,
    },
    /// Position outside `[0, block_size)`.
    PositionOutOfRange {
        /// Offending position.
        pos: usize,
        /// Maximum context length.
        block_size: usize,
    },
    /// The step's loss was NaN or infinite; no update was applied.
    NonFiniteLoss {
        /// Step counter at the time of the failure.
        step: usize,
        /// The offending loss value.
        loss: f64,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => e.fmt(f),
            EngineError::Data(e) => e.fmt(f),
            EngineError::Tokenizer(e) => e.fmt(f),
            EngineError::InvalidTemperature(t) => {
                write!(f, "temperature must be finite and > 0, got {t}")
            }
            EngineError::InvalidTargetSteps => {
                write!(f, "total target steps must be greater than 0")
            }
            EngineError::TokenOutOfRange { id, vocab_size } => {
                write!(f, "token id {id} out of range for vocab size {vocab_size}")
            }
            EngineError::PositionOutOfRange { pos, block_size } => {
                write!(f, "position {pos} out of range for block size {block_size}")
            }
            EngineError::NonFiniteLoss { step, loss } => {
                write!(f, "non-finite loss {loss} at step {step}; update skipped")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::Data(e) => Some(e),
            EngineError::Tokenizer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<DataError> for EngineError {
    fn from(e: DataError) -> Self {
        EngineError::Data(e)
    }
}

impl From<TokenizerError> for EngineError {
    fn from(e: TokenizerError) -> Self {
        EngineError::Tokenizer(e)
    }
}
