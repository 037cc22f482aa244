//! Character-level tokenizer: one token per code point, sorted vocab, BOS last.

use std::collections::BTreeSet;

use tracing::warn;

use super::super::{Tokenizer, TokenizerError, UnknownCharPolicy, Vocab};

/// Display name of the boundary token.
pub const BOS_LABEL: &str = "BOS";

/// Character-level tokenizer.
///
/// Ids `[0, n)` are the distinct corpus characters in sorted order and id `n`
/// is the BOS marker, so `vocab_size == n + 1`.
#[derive(Clone, Debug)]
pub struct CharTokenizer {
    vocab: Vocab,
    chars: Vec<char>,
    bos_id: usize,
    unknown: UnknownCharPolicy,
}

impl CharTokenizer {
    /// Builds the vocabulary from every character of every document.
    #[must_use]
    pub fn from_corpus<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<char> = docs
            .into_iter()
            .flat_map(|d| d.as_ref().chars().collect::<Vec<_>>())
            .collect();
        let chars: Vec<char> = unique.into_iter().collect();
        let bos_id = chars.len();
        let vocab = Vocab::new(
            chars
                .iter()
                .map(char::to_string)
                .chain(std::iter::once(BOS_LABEL.to_string())),
        );
        CharTokenizer {
            vocab,
            chars,
            bos_id,
            unknown: UnknownCharPolicy::default(),
        }
    }

    /// Replaces the unknown-character policy.
    #[must_use]
    pub fn with_unknown_policy(mut self, policy: UnknownCharPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// Current unknown-character policy.
    #[must_use]
    pub fn unknown_policy(&self) -> UnknownCharPolicy {
        self.unknown
    }

    /// Sorted vocabulary characters (without BOS).
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Encodes `text` and wraps it with BOS on both sides: `"ab"` → `[BOS, a, b, BOS]`.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::UnknownSymbol`] under [`UnknownCharPolicy::Reject`].
    pub fn tokenize(&self, text: &str) -> Result<Vec<usize>, TokenizerError> {
        let mut tokens = Vec::with_capacity(text.chars().count() + 2);
        tokens.push(self.bos_id);
        tokens.extend(self.encode(text)?);
        tokens.push(self.bos_id);
        Ok(tokens)
    }

    /// Inverse mapping for a single id: the character, or `"BOS"` for the marker.
    #[must_use]
    pub fn label(&self, id: usize) -> Option<&str> {
        self.vocab.get_symbol(id)
    }

    /// The character for `id`, or `None` for BOS and out-of-range ids.
    #[must_use]
    pub fn char_of(&self, id: usize) -> Option<char> {
        self.chars.get(id).copied()
    }

    fn lookup(&self, ch: char) -> Option<usize> {
        let mut buf = [0u8; 4];
        self.vocab.get_id(ch.encode_utf8(&mut buf))
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, s: &str) -> Result<Vec<usize>, TokenizerError> {
        s.chars()
            .map(|ch| match (self.lookup(ch), self.unknown) {
                (Some(id), _) => Ok(id),
                (None, UnknownCharPolicy::MapToZero) => {
                    warn!(character = %ch, "unknown character mapped to token 0");
                    Ok(0)
                }
                (None, UnknownCharPolicy::Reject) => {
                    Err(TokenizerError::UnknownSymbol(ch.to_string()))
                }
            })
            .collect()
    }

    fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError> {
        let mut s = String::new();
        for &id in ids {
            let sym = self
                .vocab
                .get_symbol(id)
                .ok_or(TokenizerError::InvalidId(id))?;
            s.push_str(sym);
        }
        Ok(s)
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn bos_id(&self) -> usize {
        self.bos_id
    }
}
