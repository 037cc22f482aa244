//! Adam optimizer with bias correction over a flat parameter list.

use crate::autograd::{Graph, NodeId};
use crate::config::Config;

/// Adam state: first and second moment per parameter, aligned by index.
#[derive(Clone, Debug)]
pub struct Adam {
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    /// Zeroed moments for `n_params` parameters.
    #[must_use]
    pub fn new(n_params: usize, config: &Config) -> Self {
        Adam {
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            m: vec![0.0; n_params],
            v: vec![0.0; n_params],
        }
    }

    /// First moments.
    #[must_use]
    pub fn m(&self) -> &[f64] {
        &self.m
    }

    /// Second moments.
    #[must_use]
    pub fn v(&self) -> &[f64] {
        &self.v
    }

    /// Applies one update to every parameter and resets its gradient to 0.
    ///
    /// `t` is the 1-based step used for bias correction.
    pub fn step(&mut self, graph: &mut Graph, params: &[NodeId], lr: f64, t: usize) {
        debug_assert_eq!(params.len(), self.m.len(), "moment/param length mismatch");
        let t = i32::try_from(t).unwrap_or(i32::MAX);
        let bias1 = 1.0 - self.beta1.powi(t);
        let bias2 = 1.0 - self.beta2.powi(t);
        for (i, &p) in params.iter().enumerate() {
            let grad = graph.grad(p);
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grad;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = self.m[i] / bias1;
            let v_hat = self.v[i] / bias2;

            let new_data = graph.value(p) - lr * m_hat / (v_hat.sqrt() + self.epsilon);
            graph.set_value(p, new_data);
            graph.zero_grad(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_learning_rate_against_gradient() {
        let mut g = Graph::new();
        let p = g.constant(1.0);
        let loss = g.mul(p, p);
        g.backward(loss);
        assert_eq!(g.grad(p), 2.0);

        let mut adam = Adam::new(1, &Config::default());
        adam.step(&mut g, &[p], 0.1, 1);
        // m_hat = g, v_hat = g^2, so the update is lr * g / (|g| + eps)
        assert!((g.value(p) - 0.9).abs() < 1e-6);
        assert_eq!(g.grad(p), 0.0);
        assert!((adam.m()[0] - 0.15 * 2.0).abs() < 1e-12);
        assert!((adam.v()[0] - 0.01 * 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_learning_rate_leaves_values_but_updates_moments() {
        let mut g = Graph::new();
        let p = g.constant(-0.5);
        let three = g.constant(3.0);
        let loss = g.mul(p, three);
        g.backward(loss);

        let mut adam = Adam::new(1, &Config::default());
        adam.step(&mut g, &[p], 0.0, 1);
        assert_eq!(g.value(p), -0.5);
        assert!(adam.m()[0] > 0.0 && adam.v()[0] > 0.0);
    }

    #[test]
    fn zero_gradient_is_a_no_op() {
        let mut g = Graph::new();
        let p = g.constant(2.0);
        let mut adam = Adam::new(1, &Config::default());
        adam.step(&mut g, &[p], 0.01, 1);
        assert_eq!(g.value(p), 2.0);
        assert_eq!(adam.m(), [0.0]);
    }
}
