use crate::error::{Result, Word2VecError};
use crate::sampler::TrainingPair;
use std::slice::Chunks;

/// Contiguous mini-batches over a pair stream, in order and without padding.
/// The last batch can be smaller than `batch_size`. Consumed once per epoch.
pub struct Batches<'a> {
    chunks: Chunks<'a, TrainingPair>,
}

impl<'a> Batches<'a> {
    pub fn new(pairs: &'a [TrainingPair], batch_size: usize) -> Result<Batches<'a>> {
        if batch_size == 0 {
            return Err(Word2VecError::InvalidBatchSize(batch_size));
        }
        Ok(Self { chunks: pairs.chunks(batch_size) })
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = &'a [TrainingPair];

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}


#[cfg(test)]
mod tests {

    use super::*;

    fn pairs(n: usize) -> Vec<TrainingPair> {
        (0..n).map(|i| TrainingPair::new(vec![i], i + 1)).collect()
    }

    #[test]
    fn batches_concatenate_back_to_the_stream() {
        let stream = pairs(10);
        let batches: Vec<&[TrainingPair]> = Batches::new(&stream, 3).unwrap().collect();
        assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<usize>>(), vec![3, 3, 3, 1]);

        let rebuilt: Vec<TrainingPair> = batches.concat();
        assert_eq!(rebuilt, stream);
    }

    #[test]
    fn exact_multiple_has_no_short_batch() {
        let stream = pairs(8);
        let batches = Batches::new(&stream, 4).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.into_iter().all(|b| b.len() == 4));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let stream: Vec<TrainingPair> = Vec::new();
        assert_eq!(Batches::new(&stream, 5).unwrap().count(), 0);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let stream = pairs(2);
        assert!(matches!(Batches::new(&stream, 0), Err(Word2VecError::InvalidBatchSize(0))));
    }

}
