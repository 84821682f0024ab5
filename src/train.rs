use crate::batch::Batches;
use crate::config::TrainConfig;
use crate::error::{Result, Word2VecError};
use crate::nce::{batch_loss, NceParams, NoiseDistribution};
use crate::optim::{Optimizer, Sgd};
use crate::sampler::corpus_pairs;
use crate::vocab::{pad_sentence, Tokenizer, Vocabulary, WhitespaceTokenizer};
use log::{debug, info};
use ndarray::prelude::*;
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use once_cell::unsync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::Instant;

/// Lifecycle of a trainer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainerState {
    /// Parameters allocated, no training done.
    Uninitialized,
    /// Every configured epoch ran to completion.
    Trained,
    /// A training run failed midway, the instance must be discarded.
    Aborted,
}

struct DisplayProgress {
    epoch_loss: f32,      // sum of the mean loss of every batch seen
    n_batches: usize,     // batches seen in this epoch
    total_batches: usize, // batches in this epoch
}

impl DisplayProgress {

    fn new(total_batches: usize) -> Self {
        Self {
            epoch_loss: 0.0,
            n_batches: 0,
            total_batches,
        }
    }

    fn record(&mut self, batch_loss: f32) {
        self.epoch_loss += batch_loss;
        self.n_batches += 1;
    }

    fn mean_loss(&self) -> f32 {
        self.epoch_loss / self.n_batches.max(1) as f32
    }

}

/// Word2vec model trained with negative sampling.
///
/// The trainer owns the embedding matrix and the negative sampling tensors.
/// Row `id - 1` of every tensor belongs to vocabulary id `id`.
pub struct Word2Vec<T: Tokenizer = WhitespaceTokenizer> {
    config: TrainConfig,
    tokenizer: T,
    vocab: Vocabulary,
    sequences: Vec<Vec<usize>>,
    embedding_matrix: Array2<f32>,
    nce: NceParams,
    noise: NoiseDistribution,
    optimizer: Sgd,
    rng: StdRng,
    state: TrainerState,
    epoch_losses: Vec<f32>,
    embedding_dict: OnceCell<HashMap<String, Array1<f32>>>,
}

impl Word2Vec {

    pub fn new<S: AsRef<str>>(texts: &[S], config: TrainConfig) -> Result<Word2Vec> {
        Word2Vec::with_tokenizer(texts, config, WhitespaceTokenizer)
    }

}

impl<T: Tokenizer> Word2Vec<T> {

    /// Pads and tokenizes `texts`, builds the vocabulary and validates `config`
    /// against it. Tensors are allocated only once validation passed.
    pub fn with_tokenizer<S: AsRef<str>>(texts: &[S], config: TrainConfig, tokenizer: T) -> Result<Word2Vec<T>> {

        // vocabulary independent checks come before any pass over the corpus
        config.validate_static()?;

        let padded_texts: Vec<String> = texts
            .iter()
            .map(|text| pad_sentence(text.as_ref(), config.window_size))
            .collect();

        let vocab = Vocabulary::build(&padded_texts, &tokenizer)?;
        let vocab_size = vocab.vocab_size();
        config.validate(vocab_size)?;

        let sequences: Vec<Vec<usize>> = padded_texts
            .iter()
            .map(|text| vocab.encode(text, &tokenizer))
            .collect();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let shape = (vocab_size, config.embedding_dim);
        let embedding_matrix = Array::random_using(shape, Uniform::new_inclusive(-1.0, 1.0), &mut rng);
        let nce = NceParams::new(vocab_size, config.embedding_dim, &mut rng)?;
        let noise = NoiseDistribution::from_counts(vocab.counts())?;
        let optimizer = Sgd::new(config.learning_rate);

        info!("built vocabulary of {} tokens from {} sentences", vocab_size, texts.len());

        Ok(Self {
            config,
            tokenizer,
            vocab,
            sequences,
            embedding_matrix,
            nce,
            noise,
            optimizer,
            rng,
            state: TrainerState::Uninitialized,
            epoch_losses: Vec::new(),
            embedding_dict: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Mean batch loss of every finished epoch, in order.
    pub fn epoch_losses(&self) -> &[f32] {
        &self.epoch_losses
    }

    pub fn last_epoch_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }

    /// Runs `epoch_count` epochs over the corpus.
    ///
    /// A failure leaves the tensors as the last successful batch left them and
    /// the trainer refuses any further training. Training a trained model runs
    /// more epochs on the same tensors and drops the cached embeddings.
    pub fn train(&mut self) -> Result<()> {

        if self.state == TrainerState::Aborted {
            return Err(Word2VecError::TrainingAborted);
        }
        if self.sequences.iter().all(|seq| seq.len() < 2 * self.config.window_size + 1) {
            return Err(Word2VecError::EmptyCorpus);
        }

        let timer = Instant::now();
        info!("starting training, {}", self.config);

        match self.run_epochs() {
            Ok(()) => {
                self.state = TrainerState::Trained;
                self.embedding_dict.take();
                info!("Training finished, took {} seconds", timer.elapsed().as_secs());
                Ok(())
            },
            Err(e) => {
                self.state = TrainerState::Aborted;
                Err(e)
            }
        }
    }

    fn run_epochs(&mut self) -> Result<()> {

        let window_size = self.config.window_size;
        let architecture = self.config.architecture;
        let k = self.config.negative_sample_count;
        let c_bar = 10000;

        for epoch in 0..self.config.epoch_count {

            let timer = Instant::now();

            // the pair stream is rebuilt every epoch, batches are consumed once
            let pairs = corpus_pairs(&self.sequences, window_size, architecture);
            let batches = Batches::new(&pairs, self.config.batch_size)?;
            let mut progress = DisplayProgress::new(batches.len());

            for (pp, batch) in batches.enumerate() {

                if pp % c_bar == 0 && pp > 0 {
                    debug!("epoch {}, batch {} / {}, loss: {}", epoch, pp, progress.total_batches, progress.mean_loss());
                }

                let negatives: Vec<Vec<usize>> = batch
                    .iter()
                    .map(|pair| self.noise.sample_negatives(&mut self.rng, pair.target() - 1, k))
                    .collect();

                let (loss, grads) = batch_loss(&self.embedding_matrix, &self.nce, &self.noise, batch, &negatives)?;
                self.optimizer.step(&mut self.embedding_matrix, &mut self.nce, &grads);
                progress.record(loss);
            }

            info!("finished epoch {}, {} batches, loss is {}, took: {} seconds...",
                epoch, progress.n_batches, progress.mean_loss(), timer.elapsed().as_secs());
            self.epoch_losses.push(progress.mean_loss());
        }

        Ok(())
    }

    /// Token to vector snapshot of the trained embedding matrix, built on the
    /// first call and cached afterwards.
    pub fn embeddings(&self) -> Result<&HashMap<String, Array1<f32>>> {
        if self.state != TrainerState::Trained {
            return Err(Word2VecError::ModelNotTrained);
        }
        Ok(self.embedding_dict.get_or_init(|| self.build_embedding_dict()))
    }

    pub fn embedding(&self, token: &str) -> Result<Option<&Array1<f32>>> {
        Ok(self.embeddings()?.get(token))
    }

    fn build_embedding_dict(&self) -> HashMap<String, Array1<f32>> {
        self.vocab
            .iter()
            .map(|(id, token)| (token.to_owned(), self.embedding_matrix.row(id - 1).to_owned()))
            .collect()
    }

}
