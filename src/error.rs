use thiserror::Error;

/// Errors raised while building, training or querying a word2vec model.
#[derive(Error, Debug)]
pub enum Word2VecError {
    /// Vocabulary build attempted on zero sentences.
    #[error("cannot build a vocabulary from an empty corpus")]
    EmptyCorpus,

    /// Out of range hyper parameter, reported before any tensor is allocated.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("batch size must be positive, got {0}")]
    InvalidBatchSize(usize),

    /// The embeddings were requested before a full training run completed.
    #[error("model is not trained yet, call train() first")]
    ModelNotTrained,

    /// Non finite loss or logit during a batch, aborts the training run.
    #[error("numerical fault during training: {0}")]
    NumericalFault(String),

    /// A previous `train` call failed midway, the instance must be discarded.
    #[error("a previous training run was aborted, this trainer cannot be reused")]
    TrainingAborted,

    #[error("token not found in vocabulary: {0}")]
    TokenNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Word2VecError>;
