//! Negative sampling (noise contrastive estimation) objective.
//!
//! Every example scores its true target against `k` ids drawn from a noise
//! distribution `Q`. The logit of a candidate `c` is corrected by the expected
//! count of `c` among the samples:
//!
//! ```text
//! logit(c) = W[c] . h + b[c] - ln(k * Q(c))
//! loss     = softplus(-logit(t)) + sum_j softplus(logit(n_j))
//! ```
//!
//! The batch loss is the mean of the per example losses.

use crate::error::{Result, Word2VecError};
use crate::sampler::TrainingPair;
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_rand::rand_distr::{Distribution, Normal};
use ndarray_rand::RandomExt;
use rand::distributions::WeightedIndex;
use rand::Rng;

// exponent applied to unigram counts, flattens the distribution toward rare tokens
const NOISE_POWER: f64 = 0.75;

/// Normal distribution resampled until it falls within two standard deviations.
pub struct TruncatedNormal {
    normal: Normal<f32>,
    bound: f32,
}

impl TruncatedNormal {
    pub fn new(std_dev: f32) -> Result<TruncatedNormal> {
        let normal = Normal::new(0.0, std_dev)
            .map_err(|e| Word2VecError::NumericalFault(format!("truncated normal: {}", e)))?;
        Ok(Self { normal, bound: 2.0 * std_dev })
    }
}

impl Distribution<f32> for TruncatedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        loop {
            let x = self.normal.sample(rng);
            if x.abs() <= self.bound {
                return x;
            }
        }
    }
}

/// Unigram^0.75 distribution over vocabulary rows (`id - 1`).
pub struct NoiseDistribution {
    probs: Vec<f32>,
    index: WeightedIndex<f64>,
}

impl NoiseDistribution {

    pub fn from_counts(counts: &[usize]) -> Result<NoiseDistribution> {

        let weights: Vec<f64> = counts.iter().map(|&c| (c as f64).powf(NOISE_POWER)).collect();
        let total: f64 = weights.iter().sum();
        let index = WeightedIndex::new(&weights)
            .map_err(|e| Word2VecError::NumericalFault(format!("noise distribution: {}", e)))?;
        let probs = weights.iter().map(|w| (w / total) as f32).collect();

        Ok(Self { probs, index })
    }

    pub fn prob(&self, row: usize) -> f32 {
        self.probs[row]
    }

    /// Draws `k` rows with replacement, never returning `target`.
    pub fn sample_negatives<R: Rng + ?Sized>(&self, rng: &mut R, target: usize, k: usize) -> Vec<usize> {
        let mut negatives = Vec::with_capacity(k);
        while negatives.len() < k {
            let row = self.index.sample(rng);
            if row != target {
                negatives.push(row);
            }
        }
        negatives
    }
}

/// Output side weights and biases of the objective, never exposed by the trainer.
pub struct NceParams {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl NceParams {
    pub fn new<R: Rng + ?Sized>(vocab_size: usize, embedding_dim: usize, rng: &mut R) -> Result<NceParams> {
        let std_dev = 1.0 / (vocab_size as f32).sqrt();
        let weights = Array2::random_using((vocab_size, embedding_dim), TruncatedNormal::new(std_dev)?, rng);
        Ok(Self {
            weights,
            biases: Array1::zeros(vocab_size),
        })
    }
}

/// Sparse per row gradients of one batch. Rows may repeat, their
/// contributions add up.
#[derive(Debug, Default)]
pub struct Gradients {
    pub embeddings: Vec<(usize, Array1<f32>)>,
    pub weights: Vec<(usize, Array1<f32>)>,
    pub biases: Vec<(usize, f32)>,
}

fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

// ln(1 + e^x) without overflow
fn softplus(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Input vector of an example, the sum of its context rows.
pub fn input_vector(embeddings: &Array2<f32>, context: &[usize]) -> Array1<f32> {
    let mut h = Array1::zeros(embeddings.ncols());
    for &id in context {
        h += &embeddings.row(id - 1);
    }
    h
}

fn logit(nce: &NceParams, noise: &NoiseDistribution, h: &ArrayView1<f32>, row: usize, k: usize) -> Result<f32> {
    let logit = nce.weights.row(row).dot(h) + nce.biases[row] - (k as f32 * noise.prob(row)).ln();
    if !logit.is_finite() {
        return Err(Word2VecError::NumericalFault(format!("non finite logit for row {}", row)));
    }
    Ok(logit)
}

/// Mean loss of a batch together with its gradients.
///
/// `negatives[e]` holds the noise rows drawn for example `e`, their count is `k`.
pub fn batch_loss(
    embeddings: &Array2<f32>,
    nce: &NceParams,
    noise: &NoiseDistribution,
    batch: &[TrainingPair],
    negatives: &[Vec<usize>],
) -> Result<(f32, Gradients)> {

    let this_batch = batch.len();
    let scale = 1.0 / this_batch as f32;
    let mut grads = Gradients::default();
    let mut total_loss = 0.0f32;

    for (pair, negs) in batch.iter().zip(negatives) {

        let k = negs.len();
        let h = input_vector(embeddings, &pair.context);
        let target = pair.target() - 1;

        // true target, label 1
        let z = logit(nce, noise, &h.view(), target, k)?;
        total_loss += softplus(-z);
        let g = (sigmoid(z) - 1.0) * scale;
        let mut grad_h: Array1<f32> = nce.weights.row(target).mapv(|w| w * g);
        grads.weights.push((target, h.mapv(|x| x * g)));
        grads.biases.push((target, g));

        // noise samples, label 0
        for &row in negs {
            let z = logit(nce, noise, &h.view(), row, k)?;
            total_loss += softplus(z);
            let g = sigmoid(z) * scale;
            grad_h.scaled_add(g, &nce.weights.row(row));
            grads.weights.push((row, h.mapv(|x| x * g)));
            grads.biases.push((row, g));
        }

        for &id in &pair.context {
            grads.embeddings.push((id - 1, grad_h.clone()));
        }
    }

    let loss = total_loss * scale;
    if !loss.is_finite() {
        return Err(Word2VecError::NumericalFault(format!("batch loss is {}", loss)));
    }

    Ok((loss, grads))
}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dense(rows: &[(usize, Array1<f32>)], shape: (usize, usize)) -> Array2<f32> {
        let mut out = Array2::zeros(shape);
        for (row, g) in rows {
            let mut r = out.row_mut(*row);
            r += g;
        }
        out
    }

    fn toy() -> (Array2<f32>, NceParams, NoiseDistribution, Vec<TrainingPair>, Vec<Vec<usize>>) {
        let embeddings = array![[0.1, -0.2, 0.3], [0.4, 0.0, -0.5], [-0.3, 0.2, 0.1], [0.2, 0.2, 0.2]];
        let nce = NceParams {
            weights: array![[0.05, -0.1, 0.2], [-0.2, 0.1, 0.0], [0.3, -0.3, 0.1], [0.0, 0.15, -0.05]],
            biases: array![0.01, -0.02, 0.0, 0.03],
        };
        let noise = NoiseDistribution::from_counts(&[3, 1, 2, 4]).unwrap();
        let batch = vec![TrainingPair::new(vec![1, 3], 2), TrainingPair::new(vec![4], 1)];
        let negatives = vec![vec![0, 3], vec![2, 2]];
        (embeddings, nce, noise, batch, negatives)
    }

    #[test]
    fn noise_follows_powered_counts() {
        let noise = NoiseDistribution::from_counts(&[1, 16, 81]).unwrap();
        // 1^0.75, 16^0.75, 81^0.75 = 1, 8, 27
        assert!((noise.prob(0) - 1.0 / 36.0).abs() < 1e-6);
        assert!((noise.prob(1) - 8.0 / 36.0).abs() < 1e-6);
        assert!((noise.prob(2) - 27.0 / 36.0).abs() < 1e-6);
    }

    #[test]
    fn negatives_never_hit_the_target() {
        let noise = NoiseDistribution::from_counts(&[5, 1, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let negs = noise.sample_negatives(&mut rng, 0, 2);
            assert_eq!(negs.len(), 2);
            assert!(negs.iter().all(|&r| r == 1 || r == 2));
        }
    }

    #[test]
    fn zero_counts_cannot_build_noise() {
        assert!(matches!(NoiseDistribution::from_counts(&[0, 0]), Err(Word2VecError::NumericalFault(_))));
    }

    #[test]
    fn truncated_normal_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = NceParams::new(16, 8, &mut rng).unwrap();
        let bound = 2.0 / 4.0;
        assert!(params.weights.iter().all(|w| w.abs() <= bound));
        assert!(params.biases.iter().all(|b| *b == 0.0));
    }

    #[test]
    fn cbow_input_is_sum_of_context_rows() {
        let (embeddings, ..) = toy();
        let h = input_vector(&embeddings, &[1, 3]);
        let expected: Array1<f32> = array![-0.2, 0.0, 0.4];
        assert!(h.iter().zip(expected.iter()).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn loss_is_mean_of_example_losses() {
        let (embeddings, nce, noise, batch, negatives) = toy();
        let (loss, _) = batch_loss(&embeddings, &nce, &noise, &batch, &negatives).unwrap();
        let (first, _) = batch_loss(&embeddings, &nce, &noise, &batch[..1], &negatives[..1]).unwrap();
        let (second, _) = batch_loss(&embeddings, &nce, &noise, &batch[1..], &negatives[1..]).unwrap();
        assert!((loss - (first + second) / 2.0).abs() < 1e-5);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let (embeddings, nce, noise, batch, negatives) = toy();
        let (_, grads) = batch_loss(&embeddings, &nce, &noise, &batch, &negatives).unwrap();
        let shape = embeddings.dim();
        let g_emb = dense(&grads.embeddings, shape);
        let g_w = dense(&grads.weights, shape);
        let eps = 1e-2;

        for r in 0..shape.0 {
            for c in 0..shape.1 {
                let mut plus = embeddings.clone();
                plus[[r, c]] += eps;
                let mut minus = embeddings.clone();
                minus[[r, c]] -= eps;
                let (lp, _) = batch_loss(&plus, &nce, &noise, &batch, &negatives).unwrap();
                let (lm, _) = batch_loss(&minus, &nce, &noise, &batch, &negatives).unwrap();
                assert!(((lp - lm) / (2.0 * eps) - g_emb[[r, c]]).abs() < 1e-2);

                let mut nce_plus = NceParams { weights: nce.weights.clone(), biases: nce.biases.clone() };
                nce_plus.weights[[r, c]] += eps;
                let mut nce_minus = NceParams { weights: nce.weights.clone(), biases: nce.biases.clone() };
                nce_minus.weights[[r, c]] -= eps;
                let (lp, _) = batch_loss(&embeddings, &nce_plus, &noise, &batch, &negatives).unwrap();
                let (lm, _) = batch_loss(&embeddings, &nce_minus, &noise, &batch, &negatives).unwrap();
                assert!(((lp - lm) / (2.0 * eps) - g_w[[r, c]]).abs() < 1e-2);
            }
        }

        let mut g_b = Array1::<f32>::zeros(shape.0);
        for (row, g) in &grads.biases {
            g_b[*row] += g;
        }
        for r in 0..shape.0 {
            let mut nce_plus = NceParams { weights: nce.weights.clone(), biases: nce.biases.clone() };
            nce_plus.biases[r] += eps;
            let mut nce_minus = NceParams { weights: nce.weights.clone(), biases: nce.biases.clone() };
            nce_minus.biases[r] -= eps;
            let (lp, _) = batch_loss(&embeddings, &nce_plus, &noise, &batch, &negatives).unwrap();
            let (lm, _) = batch_loss(&embeddings, &nce_minus, &noise, &batch, &negatives).unwrap();
            assert!(((lp - lm) / (2.0 * eps) - g_b[r]).abs() < 1e-2);
        }
    }

    #[test]
    fn non_finite_input_is_a_numerical_fault() {
        let (mut embeddings, nce, noise, batch, negatives) = toy();
        embeddings[[0, 0]] = f32::INFINITY;
        assert!(matches!(
            batch_loss(&embeddings, &nce, &noise, &batch, &negatives),
            Err(Word2VecError::NumericalFault(_))
        ));
    }

}
