mod batch;
mod config;
mod error;
mod nce;
mod optim;
mod pipeline;
mod sampler;
mod similarity;
mod train;
mod vocab;

pub use batch::Batches;
pub use config::{Config, PipelineParams, TrainConfig};
pub use error::{Result, Word2VecError};
pub use nce::{Gradients, NceParams, NoiseDistribution};
pub use optim::{Optimizer, Sgd};
pub use pipeline::Pipeline;
pub use sampler::{cbow_pairs, corpus_pairs, skipgram_pairs, Architecture, Sampler, TrainingPair};
pub use similarity::Similarity;
pub use train::{TrainerState, Word2Vec};
pub use vocab::{pad_sentence, Tokenizer, Vocabulary, WhitespaceTokenizer};
