use crate::error::{Result, Word2VecError};
use log::warn;
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use std::collections::HashMap;

/// Cosine similarity queries over trained vectors.
pub struct Similarity {
    w: Array2<f32>,
    t2i: HashMap<String, usize>,
    i2t: Vec<String>,
}

fn l2_normalized(vec: &ArrayView1<f32>) -> Result<Array1<f32>> {
    let norm = vec.dot(vec).sqrt();
    if !norm.is_normal() {
        return Err(Word2VecError::NumericalFault(format!("cannot normalize a vector of norm {}", norm)));
    }
    Ok(vec.mapv(|a| a / norm))
}

impl Similarity {

    /// Rows are l2 normalized so that dot products are cosine similarities.
    /// Tokens whose vector cannot be normalized are left out with a warning.
    pub fn new(embeddings: &HashMap<String, Array1<f32>>) -> Similarity {

        // fixed token order so that ties resolve the same way on every run
        let mut tokens: Vec<&String> = embeddings.keys().collect();
        tokens.sort();

        let mut i2t: Vec<String> = Vec::with_capacity(tokens.len());
        let mut rows: Vec<Array1<f32>> = Vec::with_capacity(tokens.len());
        for token in tokens {
            match l2_normalized(&embeddings[token].view()) {
                Ok(normalized) => {
                    i2t.push(token.to_owned());
                    rows.push(normalized);
                },
                Err(e) => warn!("skipping token {}: {}", token, e),
            }
        }

        let dim = embeddings.values().next().map(|v| v.len()).unwrap_or(0);
        let mut w: Array2<f32> = Array2::zeros((i2t.len(), dim));
        for (i, row) in rows.iter().enumerate() {
            w.slice_mut(s![i, ..]).assign(row);
        }

        let t2i = i2t.iter().enumerate().map(|(i, t)| (t.to_owned(), i)).collect();

        Self { w, t2i, i2t }
    }

    pub fn extract_vec_from_word(&self, token: &str) -> Result<Array1<f32>> {
        match self.t2i.get(token) {
            Some(i) => Ok(self.w.slice(s![*i, ..]).to_owned()),
            None => Err(Word2VecError::TokenNotFound(token.to_string())),
        }
    }

    fn scores(&self, vec: &Array1<f32>) -> Result<Array1<f32>> {
        let query = l2_normalized(&vec.view())?;
        Ok(self.w.dot(&query))
    }

    fn top_k(&self, scores: &Array1<f32>, k: usize, exclude: &[&str]) -> Vec<(String, f32)> {

        let mut indexed_scores: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| !exclude.contains(&self.i2t[*i].as_str()))
            .collect();

        // sort by most similar in descending order
        indexed_scores.sort_by(|(i, s), (j, t)| t.total_cmp(s).then_with(|| self.i2t[*i].cmp(&self.i2t[*j])));

        indexed_scores
            .into_iter()
            .take(k)
            .map(|(i, score)| (self.i2t[i].to_owned(), score))
            .collect()
    }

    /// The `k` tokens closest to `vec`, most similar first.
    pub fn find_k_most_similar(&self, vec: &Array1<f32>, k: usize) -> Result<Vec<(String, f32)>> {
        let scores = self.scores(vec)?;
        Ok(self.top_k(&scores, k, &[]))
    }

    pub fn most_similar_to_word(&self, token: &str, k: usize) -> Result<Vec<(String, f32)>> {
        let vec = self.extract_vec_from_word(token)?;
        let scores = self.scores(&vec)?;
        Ok(self.top_k(&scores, k, &[token]))
    }

    /// The single closest token to `vec`.
    pub fn nearest(&self, vec: &Array1<f32>) -> Result<(String, f32)> {
        let scores = self.scores(vec)?;
        let best = scores
            .argmax()
            .map_err(|e| Word2VecError::NumericalFault(format!("no nearest token: {}", e)))?;
        Ok((self.i2t[best].to_owned(), scores[best]))
    }

    pub fn extract_analogy_vec(&self, inputs: [&str; 3]) -> Result<Array1<f32>> {
        let a = self.extract_vec_from_word(inputs[0])?;
        let b = self.extract_vec_from_word(inputs[1])?;
        let c = self.extract_vec_from_word(inputs[2])?;
        Ok(b - a + c)
    }

    // a is to b as like c is to ?
    // translates to b - a + c : ?
    pub fn extract_analogies(&self, inputs: [&str; 3], k: usize) -> Result<Vec<(String, f32)>> {
        let analogy = self.extract_analogy_vec(inputs)?;
        let scores = self.scores(&analogy)?;
        Ok(self.top_k(&scores, k, &inputs))
    }

}
