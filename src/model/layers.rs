//! Building blocks of the forward pass: linear, softmax, rmsnorm.

use crate::autograd::{Graph, NodeId};

use super::params::Matrix;

/// Matrix–vector multiply: one dot product per row of `w`.
pub fn linear(graph: &mut Graph, x: &[NodeId], w: &Matrix) -> Vec<NodeId> {
    debug_assert_eq!(x.len(), w.cols(), "linear: input width mismatch");
    w.iter_rows()
        .map(|row| {
            let products: Vec<NodeId> = row.iter().zip(x).map(|(&wi, &xi)| graph.mul(wi, xi)).collect();
            graph.sum(&products)
        })
        .collect()
}

/// Dot product of two equal-length node slices.
pub fn dot(graph: &mut Graph, a: &[NodeId], b: &[NodeId]) -> NodeId {
    let products: Vec<NodeId> = a.iter().zip(b).map(|(&x, &y)| graph.mul(x, y)).collect();
    graph.sum(&products)
}

/// Logits → probabilities in (0, 1] summing to 1. Subtracts the max for numerical stability.
pub fn softmax(graph: &mut Graph, logits: &[NodeId]) -> Vec<NodeId> {
    let max_val = logits
        .iter()
        .map(|&l| graph.value(l))
        .fold(f64::NEG_INFINITY, f64::max);
    let max_v = graph.constant(max_val);
    let exps: Vec<NodeId> = logits
        .iter()
        .map(|&l| {
            let shifted = graph.sub(l, max_v);
            graph.exp(shifted)
        })
        .collect();
    let total = graph.sum(&exps);
    exps.iter().map(|&e| graph.div(e, total)).collect()
}

/// Plain-number softmax, for sampling and traces. Same max-subtraction as [`softmax`].
#[must_use]
pub fn softmax_values(logits: &[f64]) -> Vec<f64> {
    softmax_values_at(logits, 1.0)
}

/// Plain-number softmax of `logits / temperature`.
///
/// The max is subtracted before dividing, so the largest term is exactly
/// `exp(0)` however small the temperature.
#[must_use]
pub fn softmax_values_at(logits: &[f64], temperature: f64) -> Vec<f64> {
    let max_val = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits
        .iter()
        .map(|&l| ((l - max_val) / temperature).exp())
        .collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// Root Mean Square Normalization: `x * (mean(x^2) + eps)^-0.5`.
pub fn rmsnorm(graph: &mut Graph, x: &[NodeId], eps: f64) -> Vec<NodeId> {
    let squares: Vec<NodeId> = x.iter().map(|&xi| graph.mul(xi, xi)).collect();
    let sum_sq = graph.sum(&squares);
    let n = graph.constant(x.len() as f64);
    let ms = graph.div(sum_sq, n);
    let eps = graph.constant(eps);
    let ms_eps = graph.add(ms, eps);
    let scale = graph.pow(ms_eps, -0.5);
    x.iter().map(|&xi| graph.mul(xi, scale)).collect()
}
