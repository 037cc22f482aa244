//! [`DataItem`] (one non-empty document) and [`Corpus`] (non-empty list of documents).

use std::fmt;

use super::DataError;

/// A single non-empty document (e.g. one name).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataItem(String);

impl DataItem {
    /// Creates a [`DataItem`] from trimmed text.
    ///
    /// # Errors
    ///
    /// - [`DataError::EmptyDocument`] when `text` is empty or only whitespace.
    pub fn new(text: &str) -> Result<Self, DataError> {
        let s = text.trim();
        if s.is_empty() {
            return Err(DataError::EmptyDocument);
        }
        Ok(DataItem(s.to_string()))
    }

    /// Returns the inner string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Training corpus: a non-empty, ordered list of [`DataItem`]s.
#[derive(Clone, Debug)]
pub struct Corpus(Vec<DataItem>);

impl Corpus {
    /// Builds a corpus from items.
    ///
    /// # Errors
    ///
    /// - [`DataError::EmptyCorpus`] when `items` is empty.
    pub fn new(items: Vec<DataItem>) -> Result<Self, DataError> {
        if items.is_empty() {
            return Err(DataError::EmptyCorpus);
        }
        Ok(Corpus(items))
    }

    /// Builds a corpus from in-memory documents, trimming each one.
    ///
    /// # Errors
    ///
    /// - [`DataError::EmptyDocument`] when a document is blank.
    /// - [`DataError::EmptyCorpus`] when there are no documents.
    pub fn from_docs<I, S>(docs: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = docs
            .into_iter()
            .map(|d| DataItem::new(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Corpus::new(items)
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed corpus.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the items as a slice.
    #[must_use]
    pub fn items(&self) -> &[DataItem] {
        &self.0
    }

    /// Returns the documents as string slices.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.0.iter().map(DataItem::as_str).collect()
    }
}
