//! GPT forward: one token at one position, with a KV cache. Returns logits over the next token.
//!
//! Embeddings → RMSNorm → for each layer: attention (Q, K, V, scale, softmax,
//! V-sum, residual) → MLP (linear, ReLU, linear, residual) → lm_head → logits.

use crate::autograd::{Graph, NodeId};
use crate::config::Config;

use super::layers::{dot, linear, rmsnorm, softmax, softmax_values};
use super::params::ModelParams;

/// Keys and values of every position seen so far, one list per layer.
///
/// A fresh cache starts each sequence; every forward call appends one entry
/// per layer.
#[derive(Clone, Debug, Default)]
pub struct KvCache {
    keys: Vec<Vec<Vec<NodeId>>>,
    values: Vec<Vec<Vec<NodeId>>>,
}

impl KvCache {
    /// Empty cache for `n_layer` layers.
    #[must_use]
    pub fn new(n_layer: usize) -> Self {
        KvCache {
            keys: vec![Vec::new(); n_layer],
            values: vec![Vec::new(); n_layer],
        }
    }

    /// Number of cached positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Intermediate values of one transformer block at one position.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerTrace {
    pub q: Vec<f64>,
    pub k: Vec<f64>,
    pub v: Vec<f64>,
    /// `[head][time]`: attention of this position over every cached position.
    pub attn_weights: Vec<Vec<f64>>,
    /// Residual stream after the attention block.
    pub after_attn: Vec<f64>,
    /// MLP hidden pre-activations (before ReLU).
    pub mlp_hidden: Vec<f64>,
    /// Which hidden units pass the ReLU.
    pub mlp_active: Vec<bool>,
    /// Residual stream after the MLP block.
    pub after_mlp: Vec<f64>,
}

/// Read-only snapshot of one forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardTrace {
    pub token_id: usize,
    pub pos_id: usize,
    pub tok_emb: Vec<f64>,
    pub pos_emb: Vec<f64>,
    /// `tok_emb + pos_emb`.
    pub combined: Vec<f64>,
    /// `combined` after the first RMSNorm.
    pub after_norm: Vec<f64>,
    pub layers: Vec<LayerTrace>,
    pub logits: Vec<f64>,
    /// Softmax of `logits` at temperature 1.
    pub probs: Vec<f64>,
}

fn residual(graph: &mut Graph, x: &[NodeId], skip: &[NodeId]) -> Vec<NodeId> {
    x.iter().zip(skip).map(|(&a, &b)| graph.add(a, b)).collect()
}

/// Node handles the traced variant reads back after a pass.
struct Pass {
    logits: Vec<NodeId>,
    combined: Vec<NodeId>,
    after_norm: Vec<NodeId>,
}

/// Runs one position through the model, appending its keys and values to `cache`.
///
/// `token` and `pos` must already be in range and `cache` built for
/// `config.n_layer` layers; [`ModelState`](super::ModelState) checks them.
pub(crate) fn gpt_forward(
    graph: &mut Graph,
    weights: &ModelParams,
    config: &Config,
    token: usize,
    pos: usize,
    cache: &mut KvCache,
) -> Vec<NodeId> {
    run(graph, weights, config, token, pos, cache, None).logits
}

/// Same as [`gpt_forward`], also copying every intermediate value into a [`ForwardTrace`].
pub(crate) fn gpt_forward_traced(
    graph: &mut Graph,
    weights: &ModelParams,
    config: &Config,
    token: usize,
    pos: usize,
    cache: &mut KvCache,
) -> (Vec<NodeId>, ForwardTrace) {
    let mut layers = Vec::with_capacity(config.n_layer);
    let pass = run(graph, weights, config, token, pos, cache, Some(&mut layers));
    let logits = graph.values(&pass.logits);
    let trace = ForwardTrace {
        token_id: token,
        pos_id: pos,
        tok_emb: graph.values(weights.wte.row(token)),
        pos_emb: graph.values(weights.wpe.row(pos)),
        combined: graph.values(&pass.combined),
        after_norm: graph.values(&pass.after_norm),
        layers,
        probs: softmax_values(&logits),
        logits,
    };
    (pass.logits, trace)
}

fn run(
    graph: &mut Graph,
    weights: &ModelParams,
    config: &Config,
    token: usize,
    pos: usize,
    cache: &mut KvCache,
    mut traces: Option<&mut Vec<LayerTrace>>,
) -> Pass {
    let eps = config.rmsnorm_eps;
    let head_dim = config.head_dim();

    // Embeddings: token + position
    let combined = residual(graph, weights.wte.row(token), weights.wpe.row(pos));
    let mut x = rmsnorm(graph, &combined, eps);
    let after_norm = x.clone();

    let scale = graph.constant((head_dim as f64).sqrt());
    for (li, layer) in weights.layers.iter().enumerate() {
        // 1) Multi-head attention
        let x_residual = x.clone();
        x = rmsnorm(graph, &x, eps);
        let q = linear(graph, &x, &layer.attn_wq);
        let k = linear(graph, &x, &layer.attn_wk);
        let v = linear(graph, &x, &layer.attn_wv);
        cache.keys[li].push(k.clone());
        cache.values[li].push(v.clone());

        let mut x_attn = Vec::with_capacity(config.n_embed);
        let mut head_weights = Vec::with_capacity(config.n_head);
        for h in 0..config.n_head {
            let hs = h * head_dim;
            let q_h = &q[hs..hs + head_dim];
            let attn_logits: Vec<NodeId> = cache.keys[li]
                .iter()
                .map(|k_t| {
                    let score = dot(graph, q_h, &k_t[hs..hs + head_dim]);
                    graph.div(score, scale)
                })
                .collect();
            let attn_weights = softmax(graph, &attn_logits);
            for j in 0..head_dim {
                let weighted: Vec<NodeId> = cache.values[li]
                    .iter()
                    .zip(&attn_weights)
                    .map(|(v_t, &w_t)| graph.mul(w_t, v_t[hs + j]))
                    .collect();
                x_attn.push(graph.sum(&weighted));
            }
            head_weights.push(attn_weights);
        }
        x = linear(graph, &x_attn, &layer.attn_wo);
        x = residual(graph, &x, &x_residual);
        let after_attn = x.clone();

        // 2) MLP: expand, ReLU, contract
        let x_residual = x.clone();
        x = rmsnorm(graph, &x, eps);
        let hidden = linear(graph, &x, &layer.mlp_fc1);
        x = hidden.iter().map(|&h| graph.relu(h)).collect();
        x = linear(graph, &x, &layer.mlp_fc2);
        x = residual(graph, &x, &x_residual);

        if let Some(traces) = traces.as_deref_mut() {
            let mlp_hidden = graph.values(&hidden);
            traces.push(LayerTrace {
                q: graph.values(&q),
                k: graph.values(&k),
                v: graph.values(&v),
                attn_weights: head_weights.iter().map(|w| graph.values(w)).collect(),
                after_attn: graph.values(&after_attn),
                mlp_active: mlp_hidden.iter().map(|&h| h > 0.0).collect(),
                mlp_hidden,
                after_mlp: graph.values(&x),
            });
        }
    }

    Pass {
        logits: linear(graph, &x, &weights.lm_head),
        combined,
        after_norm,
    }
}
