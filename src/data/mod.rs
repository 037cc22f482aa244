//! Training corpus: in-memory construction, file loading, and character statistics.
//!
//! This module defines the **trait** ([`DataLoader`]), **models** ([`DataItem`], [`Corpus`]),
//! and **error** ([`DataError`]). [`PathLoader`] reads one document per line.

mod error;
mod impls;
mod stats;
mod types;

pub use error::DataError;
pub use impls::{load_from_path, PathLoader};
pub use stats::{char_stats, CharStats};
pub use types::{Corpus, DataItem};

/// Trait for corpus sources.
pub trait DataLoader {
    /// Loads a corpus. Returns [`Corpus`] or a [`DataError`].
    fn load(&self) -> Result<Corpus, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as _;
    use std::io::Write;
    use std::path::Path;

    fn temp_file(name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f.sync_all().unwrap();
        path
    }

    #[test]
    fn load_from_path_trims_and_skips_blank_lines() {
        let path = temp_file(
            "microgpt_engine_data_lines.txt",
            &["emma", "  olivia  ", "", "   ", "ava"],
        );
        let result = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        let corpus = result.unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.lines(), ["emma", "olivia", "ava"]);
        assert_eq!(corpus.items()[1].as_str(), "olivia");
    }

    #[test]
    fn load_from_path_blank_file_returns_empty_corpus() {
        let path = temp_file("microgpt_engine_data_blank.txt", &["", "  "]);
        let result = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(DataError::EmptyCorpus)));
    }

    #[test]
    fn load_from_path_missing_file_returns_io_error() {
        let path = Path::new("/nonexistent/microgpt_engine_never_exists.txt");
        let result = PathLoader::new(path).load();
        assert!(matches!(result, Err(DataError::Io(_))));
    }

    #[test]
    fn from_docs_rejects_blank_and_empty() {
        assert!(matches!(
            Corpus::from_docs(["anna", " "]),
            Err(DataError::EmptyDocument)
        ));
        assert!(matches!(
            Corpus::from_docs(Vec::<String>::new()),
            Err(DataError::EmptyCorpus)
        ));
    }

    #[test]
    fn from_docs_keeps_order() {
        let corpus = Corpus::from_docs(vec!["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(corpus.lines(), ["b", "a"]);
        assert!(!corpus.is_empty());
        assert_eq!(corpus.items()[0].to_string(), "b");
    }

    #[test]
    fn data_error_display_and_source() {
        let e = DataError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(e.to_string().contains("data io"));
        assert!(e.source().is_some());
        assert!(DataError::EmptyCorpus.to_string().contains("empty"));
        assert!(DataError::EmptyDocument.source().is_none());
    }

    #[test]
    fn char_stats_counts_documents_and_neighbours() {
        let stats = char_stats(&["Anna", "ann", "bob"]);
        let a = &stats[&'a'];
        assert_eq!(a.doc_count, 2);
        assert_eq!(a.total_docs, 3);
        assert_eq!(a.top_followers, vec!['n']);
        assert_eq!(a.top_preceders, vec!['n']);
        assert!((a.doc_fraction() - 2.0 / 3.0).abs() < 1e-12);

        // After n: n twice, a once. Before n: a and n tie at two.
        let n = &stats[&'n'];
        assert_eq!(n.top_followers, vec!['n', 'a']);
        assert_eq!(n.top_preceders, vec!['a', 'n']);

        let b = &stats[&'b'];
        assert_eq!(b.doc_count, 1);
        assert_eq!(b.top_followers, vec!['o']);
        assert_eq!(b.top_preceders, vec!['o']);
        assert!(!stats.contains_key(&'A'));
    }
}
