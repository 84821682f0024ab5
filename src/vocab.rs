// imports
use crate::error::{Result, Word2VecError};
use std::collections::HashMap;

pub const START_TOKEN: &str = "<s>";
pub const END_TOKEN: &str = "</s>";

// defines the behavior needed for tokenizing a corpus
pub trait Tokenizer {
    fn tokenize(&self, sequence: &str) -> Vec<String>;
}

/// Lower cases and splits on whitespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, sequence: &str) -> Vec<String> {
        sequence
            .split_whitespace()
            .map(|x| x.to_lowercase())
            .collect()
    }
}

/// Wraps a sentence with `window_size` start and end markers so that boundary
/// tokens still get a full context window.
pub fn pad_sentence(sentence: &str, window_size: usize) -> String {
    let mut padded: Vec<&str> = Vec::with_capacity(2 * window_size + 1);
    padded.extend(std::iter::repeat(START_TOKEN).take(window_size));
    padded.push(sentence.trim());
    padded.extend(std::iter::repeat(END_TOKEN).take(window_size));
    padded.join(" ")
}

/// Token <-> id mapping, ids are 1-based and assigned by first appearance.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    t2i: HashMap<String, usize>,
    // i2t[id - 1] is the token of id
    i2t: Vec<String>,
    // counts[id - 1] is the number of occurrences of id in the corpus
    counts: Vec<usize>,
}

impl Vocabulary {

    pub fn build<S: AsRef<str>, T: Tokenizer>(sentences: &[S], tokenizer: &T) -> Result<Vocabulary> {

        if sentences.is_empty() {
            return Err(Word2VecError::EmptyCorpus);
        }

        let mut t2i: HashMap<String, usize> = HashMap::new();
        let mut i2t: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();

        for sentence in sentences {
            for tok in tokenizer.tokenize(sentence.as_ref()) {
                let next_id = i2t.len() + 1;
                let id = *t2i.entry(tok).or_insert_with_key(|k| {
                    i2t.push(k.to_owned());
                    counts.push(0);
                    next_id
                });
                counts[id - 1] += 1;
            }
        }

        if i2t.is_empty() {
            return Err(Word2VecError::EmptyCorpus);
        }

        Ok(Self { t2i, i2t, counts })
    }

    pub fn vocab_size(&self) -> usize {
        self.i2t.len()
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.t2i.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|i| self.i2t.get(i))
            .map(|t| t.as_str())
    }

    pub fn count(&self, id: usize) -> Option<usize> {
        id.checked_sub(1).and_then(|i| self.counts.get(i)).copied()
    }

    /// Occurrence counts indexed by `id - 1`.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Iterates `(id, token)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.i2t.iter().enumerate().map(|(i, t)| (i + 1, t.as_str()))
    }

    /// Maps a sentence to ids, tokens outside the vocabulary are dropped.
    pub fn encode<T: Tokenizer>(&self, sentence: &str, tokenizer: &T) -> Vec<usize> {
        tokenizer
            .tokenize(sentence)
            .iter()
            .filter_map(|tok| self.id(tok))
            .collect()
    }
}
