use crate::error::{Result, Word2VecError};
use crate::sampler::Architecture;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, fs::File, io::BufReader};

/// Training hyper parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub embedding_dim: usize,
    pub window_size: usize,
    pub architecture: Architecture,
    pub batch_size: usize,
    pub epoch_count: usize,
    pub negative_sample_count: usize,
    /// Constant step size, there is no decay schedule.
    pub learning_rate: f32,
    /// Seed for initialization and negative sampling, entropy when missing.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 100,
            window_size: 2,
            architecture: Architecture::SkipGram,
            batch_size: 32,
            epoch_count: 1,
            negative_sample_count: 200,
            learning_rate: 1.0,
            seed: None,
        }
    }
}

impl Display for TrainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "training hyper parameters:
        embedding_dim: {},
        window_size: {},
        architecture: {},
        batch_size: {},
        epoch_count: {},
        negative_sample_count: {},
        learning_rate: {},
        seed: {:?}",
        self.embedding_dim, self.window_size, self.architecture, self.batch_size,
        self.epoch_count, self.negative_sample_count, self.learning_rate, self.seed
        )
    }
}

impl TrainConfig {

    pub fn from_json_str(json: &str) -> Result<TrainConfig> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the hyper parameters that do not depend on the vocabulary.
    pub fn validate_static(&self) -> Result<()> {

        let invalid = |msg: String| Err(Word2VecError::InvalidConfiguration(msg));

        if self.embedding_dim == 0 {
            return invalid("embedding_dim must be positive".to_string());
        }
        if self.window_size < 1 {
            return invalid("window_size must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".to_string());
        }
        if self.epoch_count < 1 {
            return invalid("epoch_count must be at least 1".to_string());
        }
        if self.negative_sample_count == 0 {
            return invalid("negative_sample_count must be positive".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!("learning_rate must be a positive number, got {}", self.learning_rate));
        }
        Ok(())
    }

    /// Checks every hyper parameter, `negative_sample_count` is bounded by the vocabulary.
    pub fn validate(&self, vocab_size: usize) -> Result<()> {

        self.validate_static()?;

        if self.negative_sample_count >= vocab_size {
            return Err(Word2VecError::InvalidConfiguration(format!(
                "negative_sample_count must be in (0, {}), got {}",
                vocab_size, self.negative_sample_count
            )));
        }
        Ok(())
    }
}

/// Parameters of the command line pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineParams {
    pub corpus_file: String,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub train: TrainConfig,
}

fn default_top_k() -> usize {
    10
}

impl Display for PipelineParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using params:
        corpus_file: {}
        queries: {:?}
        top_k: {}
        Using {}",
        self.corpus_file, self.queries, self.top_k, self.train)
    }
}

pub struct Config {
    params: PipelineParams
}

impl Config {

    pub fn get_params(&self) -> PipelineParams {
        self.params.clone()
    }

    /// Reads the pipeline parameters from the json file named by the single program argument.
    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(Word2VecError::InvalidConfiguration(
                "input should be a path to json file only".to_string(),
            ));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let params: PipelineParams = serde_json::from_reader(f)?;

        Ok(Self { params })
    }

}
