// imports
use crate::config::Config;
use crate::error::Result;
use crate::similarity::Similarity;
use crate::train::Word2Vec;

use log::{info, warn};
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> vocabulary building and training
    // -> nearest neighbours of the query tokens

    pub fn run() -> Result<()> {

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        // one sentence per non empty line
        let timer = Instant::now();
        let mut sentences: Vec<String> = Vec::new();
        for line in BufReader::new(File::open(&params.corpus_file)?).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                sentences.push(line);
            }
        }
        info!("loaded {} sentences, took {} seconds ...", sentences.len(), timer.elapsed().as_secs());

        let timer = Instant::now();
        info!("starting vocab building and training...");
        let mut model = Word2Vec::new(&sentences, params.train.clone())?;
        model.train()?;
        info!("finished training, took {} seconds ...", timer.elapsed().as_secs());

        let sim_obj = Similarity::new(model.embeddings()?);
        for token in &params.queries {
            match sim_obj.most_similar_to_word(&token.to_lowercase(), params.top_k) {
                Ok(similarities) => {
                    for (i, (similar_token, score)) in similarities.iter().enumerate() {
                        info!("{} : {} ? {} = {}", i, token, similar_token, score);
                    }
                },
                Err(e) => warn!("skipping query {}: {}", token, e),
            }
        }

        Ok(())
    }

}
