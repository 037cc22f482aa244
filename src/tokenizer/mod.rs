//! Tokenization: encode text to token ids and decode back.
//!
//! This module defines the **trait** ([`Tokenizer`]), the unknown-character
//! policy, and the **error** ([`TokenizerError`]). [`CharTokenizer`] is the
//! character-level implementation used by the model.

mod error;
mod impls;
mod vocab;

use std::fmt;
use std::str::FromStr;

pub use error::TokenizerError;
pub use impls::CharTokenizer;
pub use vocab::Vocab;

/// Trait for tokenizers: encode text to ids and decode ids to text.
pub trait Tokenizer {
    /// Encodes a string into a sequence of token ids (no boundary markers).
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownSymbol`] if a symbol is rejected.
    fn encode(&self, s: &str) -> Result<Vec<usize>, TokenizerError>;

    /// Decodes a sequence of token ids into a string.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::InvalidId`] if an id is out of range.
    fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError>;

    /// Vocabulary size (number of distinct tokens).
    fn vocab_size(&self) -> usize;

    /// Token id used for beginning and end of sequence.
    fn bos_id(&self) -> usize;
}

/// What encoding does with a character that is not in the vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownCharPolicy {
    /// Silently substitute token id 0 (the first vocabulary character).
    ///
    /// Training documents never hit this path since the vocabulary is built
    /// from them; it only applies to caller-supplied text.
    #[default]
    MapToZero,
    /// Fail with [`TokenizerError::UnknownSymbol`].
    Reject,
}

impl fmt::Display for UnknownCharPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnknownCharPolicy::MapToZero => "zero",
            UnknownCharPolicy::Reject => "reject",
        })
    }
}

impl FromStr for UnknownCharPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" | "map_to_zero" => Ok(UnknownCharPolicy::MapToZero),
            "reject" => Ok(UnknownCharPolicy::Reject),
            other => Err(format!("expected \"zero\" or \"reject\", got {other:?}")),
        }
    }
}
