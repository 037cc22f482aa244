//! Per-character corpus statistics: document frequency and common neighbours.

use std::collections::{BTreeMap, BTreeSet};

/// How many neighbours [`char_stats`] reports per direction.
const TOP_NEIGHBOURS: usize = 3;

/// Statistics for one (lowercased) character.
#[derive(Clone, Debug, PartialEq)]
pub struct CharStats {
    /// Number of documents containing the character at least once.
    pub doc_count: usize,
    /// Number of documents in the corpus.
    pub total_docs: usize,
    /// Most frequent characters right after this one, most frequent first.
    pub top_followers: Vec<char>,
    /// Most frequent characters right before this one, most frequent first.
    pub top_preceders: Vec<char>,
}

impl CharStats {
    /// Share of documents containing the character, in `[0, 1]`.
    #[must_use]
    pub fn doc_fraction(&self) -> f64 {
        if self.total_docs == 0 {
            0.0
        } else {
            self.doc_count as f64 / self.total_docs as f64
        }
    }
}

/// Computes [`CharStats`] for every character of `docs`, lowercased.
///
/// Neighbour ties are broken by character order.
#[must_use]
pub fn char_stats<S: AsRef<str>>(docs: &[S]) -> BTreeMap<char, CharStats> {
    let mut doc_counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut after: BTreeMap<char, BTreeMap<char, usize>> = BTreeMap::new();
    let mut before: BTreeMap<char, BTreeMap<char, usize>> = BTreeMap::new();

    for doc in docs {
        let chars: Vec<char> = doc.as_ref().chars().flat_map(char::to_lowercase).collect();
        let unique: BTreeSet<char> = chars.iter().copied().collect();
        for ch in unique {
            *doc_counts.entry(ch).or_default() += 1;
        }
        for pair in chars.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            *after.entry(prev).or_default().entry(next).or_default() += 1;
            *before.entry(next).or_default().entry(prev).or_default() += 1;
        }
    }

    let top = |counts: Option<&BTreeMap<char, usize>>| -> Vec<char> {
        let mut ranked: Vec<(char, usize)> = counts
            .map(|m| m.iter().map(|(&c, &n)| (c, n)).collect())
            .unwrap_or_default();
        // BTreeMap iteration is already char-ordered; a stable sort keeps that for ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(TOP_NEIGHBOURS).map(|(c, _)| c).collect()
    };

    doc_counts
        .into_iter()
        .map(|(ch, doc_count)| {
            let stats = CharStats {
                doc_count,
                total_docs: docs.len(),
                top_followers: top(after.get(&ch)),
                top_preceders: top(before.get(&ch)),
            };
            (ch, stats)
        })
        .collect()
}
