use crate::nce::{Gradients, NceParams};
use ndarray::{Array2, s};
use std::ops::SubAssign;

/// Applies one batch of gradients to the trainable tensors.
pub trait Optimizer {
    fn step(&mut self, embeddings: &mut Array2<f32>, nce: &mut NceParams, grads: &Gradients);
}

/// Plain gradient descent with a constant learning rate.
#[derive(Clone, Copy, Debug)]
pub struct Sgd {
    learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Optimizer for Sgd {

    fn step(&mut self, embeddings: &mut Array2<f32>, nce: &mut NceParams, grads: &Gradients) {

        let lr = self.learning_rate;

        // update by index, done in a loop since no select_mut by non-consecutive indexes is available
        for (row, g) in &grads.embeddings {
            embeddings.slice_mut(s![*row, ..]).scaled_add(-lr, g);
        }
        for (row, g) in &grads.weights {
            nce.weights.slice_mut(s![*row, ..]).scaled_add(-lr, g);
        }
        for (row, g) in &grads.biases {
            nce.biases[*row].sub_assign(lr * g);
        }
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn step_moves_only_rows_with_gradients() {
        let mut embeddings: Array2<f32> = Array2::ones((3, 2));
        let mut nce = NceParams {
            weights: Array2::zeros((3, 2)),
            biases: Array1::zeros(3),
        };
        let grads = Gradients {
            embeddings: vec![(1, array![1.0, -2.0]), (1, array![1.0, 0.0])],
            weights: vec![(2, array![0.5, 0.5])],
            biases: vec![(0, 2.0)],
        };

        let mut sgd = Sgd::new(0.5);
        sgd.step(&mut embeddings, &mut nce, &grads);

        let expected_embeddings: Array2<f32> = array![[1.0, 1.0], [0.0, 2.0], [1.0, 1.0]];
        let expected_weights: Array2<f32> = array![[0.0, 0.0], [0.0, 0.0], [-0.25, -0.25]];
        let expected_biases: Array1<f32> = array![-1.0, 0.0, 0.0];
        assert_eq!(embeddings, expected_embeddings);
        assert_eq!(nce.weights, expected_weights);
        assert_eq!(nce.biases, expected_biases);
    }

    #[test]
    fn learning_rate_is_constant_across_steps() {
        let mut embeddings: Array2<f32> = Array2::zeros((1, 1));
        let mut nce = NceParams { weights: Array2::zeros((1, 1)), biases: Array1::zeros(1) };
        let grads = Gradients { embeddings: vec![(0, array![1.0])], ..Default::default() };

        let mut sgd = Sgd::new(0.25);
        for _ in 0..4 {
            sgd.step(&mut embeddings, &mut nce, &grads);
        }
        assert_eq!(sgd.learning_rate(), 0.25);
        assert_eq!(embeddings[[0, 0]], -1.0);
    }

}
