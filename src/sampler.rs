use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One training example, `label` is kept as a length-1 array so that both
/// architectures feed the loss one label per example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingPair {
    pub context: Vec<usize>,
    pub label: [usize; 1],
}

impl TrainingPair {
    pub fn new(context: Vec<usize>, label: usize) -> Self {
        Self { context, label: [label] }
    }

    pub fn target(&self) -> usize {
        self.label[0]
    }
}

pub type Sampler = fn(&[usize], usize) -> Vec<TrainingPair>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    SkipGram,
    Cbow,
}

impl Architecture {
    /// The pair generator of this architecture.
    pub fn sampler(self) -> Sampler {
        match self {
            Architecture::SkipGram => skipgram_pairs,
            Architecture::Cbow => cbow_pairs,
        }
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::SkipGram => write!(f, "skipgram"),
            Architecture::Cbow => write!(f, "cbow"),
        }
    }
}

// positions with a full window on both sides, w <= i <= len - w - 1
fn interior(len: usize, window_size: usize) -> std::ops::Range<usize> {
    if len < 2 * window_size + 1 {
        return 0..0;
    }
    window_size..len - window_size
}

/// For every interior position emits `2 * window_size` pairs of
/// `(context token, target)`, left context first then right context.
pub fn skipgram_pairs(sequence: &[usize], window_size: usize) -> Vec<TrainingPair> {

    let positions = interior(sequence.len(), window_size);
    let mut pairs = Vec::with_capacity(positions.len() * 2 * window_size);

    for i in positions {
        let target = sequence[i];
        for &context in sequence[i - window_size..i].iter().chain(&sequence[i + 1..=i + window_size]) {
            pairs.push(TrainingPair::new(vec![context], target));
        }
    }
    pairs
}

/// For every interior position emits a single pair holding the whole window.
pub fn cbow_pairs(sequence: &[usize], window_size: usize) -> Vec<TrainingPair> {

    interior(sequence.len(), window_size)
        .map(|i| {
            let context = sequence[i - window_size..i]
                .iter()
                .chain(&sequence[i + 1..=i + window_size])
                .copied()
                .collect();
            TrainingPair::new(context, sequence[i])
        })
        .collect()
}

/// Pairs of the whole corpus, concatenated in source order.
pub fn corpus_pairs(sequences: &[Vec<usize>], window_size: usize, architecture: Architecture) -> Vec<TrainingPair> {
    let sampler = architecture.sampler();
    sequences
        .par_iter()
        .map(|sequence| sampler(sequence, window_size))
        .collect::<Vec<Vec<TrainingPair>>>()
        .into_iter()
        .flatten()
        .collect()
}
