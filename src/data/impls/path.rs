//! [`DataLoader`](super::super::DataLoader) that reads a UTF-8 file, one document per line.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::super::{Corpus, DataError, DataItem, DataLoader};

/// Loads a corpus from a file path. Lines are trimmed and blank lines skipped.
#[derive(Clone, Debug)]
pub struct PathLoader<P>(pub P);

impl<P> PathLoader<P>
where
    P: AsRef<Path>,
{
    /// Creates a loader for the given path.
    #[must_use]
    pub fn new(path: P) -> Self {
        PathLoader(path)
    }
}

impl<P> DataLoader for PathLoader<P>
where
    P: AsRef<Path>,
{
    fn load(&self) -> Result<Corpus, DataError> {
        let path = self.0.as_ref();
        let content = fs::read_to_string(path)?;
        let items = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(DataItem::new)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(path = %path.display(), docs = items.len(), "loaded corpus");
        Corpus::new(items)
    }
}

/// Convenience: load a corpus from a path using [`PathLoader`].
///
/// # Errors
///
/// - [`DataError::Io`] when the path cannot be read or is not valid UTF-8.
/// - [`DataError::EmptyCorpus`] when the file has no non-blank lines.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Corpus, DataError> {
    PathLoader::new(path).load()
}
