use std::error::Error;
use word2vec_trainer::Pipeline;

fn main() -> Result<(), Box<dyn Error>> {
    Pipeline::run()?;
    Ok(())
}
