//! Errors produced when loading or validating a training corpus.

use std::fmt;

/// Errors produced by the data module.
///
/// # Variants
///
/// - **Io**: the file could not be read (missing, permission denied, invalid UTF-8).
/// - **EmptyCorpus**: no documents remain after skipping blank lines.
/// - **EmptyDocument**: a document is empty after trimming.
///   *When*: building a [`DataItem`](super::DataItem) from caller-supplied text.
#[derive(Debug)]
pub enum DataError {
    /// I/O error while reading the input file.
    Io(std::io::Error),

    /// The corpus has no documents.
    EmptyCorpus,

    /// A document was empty after trimming.
    EmptyDocument,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "data io: {e}"),
            DataError::EmptyCorpus => write!(f, "data: corpus is empty"),
            DataError::EmptyDocument => write!(f, "data: empty document in corpus"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::EmptyCorpus | DataError::EmptyDocument => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}
