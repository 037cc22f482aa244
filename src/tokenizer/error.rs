//! Errors produced when encoding or decoding with a tokenizer.

use std::fmt;

/// Errors produced by the tokenizer module.
///
/// # Variants
///
/// - **UnknownSymbol**: a character is not in the vocabulary.
///   *When*: encoding under [`UnknownCharPolicy::Reject`](super::UnknownCharPolicy::Reject).
///   *Recovery*: build the tokenizer from a corpus that contains the character, or use the
///   `MapToZero` policy.
///
/// - **InvalidId**: a token id is outside `[0, vocab_size)`.
///   *When*: during [`decode`](super::Tokenizer::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    /// A symbol not in the vocabulary was encountered during encode.
    UnknownSymbol(String),

    /// A token id is out of range during decode.
    InvalidId(usize),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnknownSymbol(s) => write!(f, "tokenizer: unknown symbol {s:?}"),
            TokenizerError::InvalidId(id) => write!(f, "tokenizer: invalid id {id}"),
        }
    }
}

impl std::error::Error for TokenizerError {}
