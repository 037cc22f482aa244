//! Model parameters: embeddings (wte, wpe), lm_head, and per-layer attention and MLP matrices.
//!
//! Every entry is a leaf node in the [`Graph`] so gradients flow through training.
//! Matrices are allocated in the same order [`ModelParams::params`] flattens them,
//! which makes the parameter list a contiguous run of arena slots.

use crate::autograd::{Graph, NodeId};
use crate::config::Config;
use crate::random::Prng;

/// Row-major matrix of parameter nodes, `rows` outputs by `cols` inputs.
#[derive(Clone, Debug)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    ids: Vec<NodeId>,
}

impl Matrix {
    /// Allocates a `rows x cols` matrix of Gaussian(0, `std`) leaves labelled `name[r][c]`.
    fn gaussian(
        graph: &mut Graph,
        rng: &mut Prng,
        name: &str,
        rows: usize,
        cols: usize,
        std: f64,
    ) -> Self {
        let mut ids = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let id = graph.constant(rng.gaussian() * std);
                graph.set_label(id, format!("{name}[{r}][{c}]"));
                ids.push(id);
            }
        }
        Matrix { rows, cols, ids }
    }

    /// Number of rows (outputs).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (inputs).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One row of node handles.
    #[must_use]
    pub fn row(&self, r: usize) -> &[NodeId] {
        &self.ids[r * self.cols..(r + 1) * self.cols]
    }

    /// Iterator over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[NodeId]> {
        self.ids.chunks(self.cols)
    }

    /// All entries in row-major order.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}

/// Weights of one transformer block.
#[derive(Clone, Debug)]
pub struct LayerParams {
    pub attn_wq: Matrix,
    pub attn_wk: Matrix,
    pub attn_wv: Matrix,
    pub attn_wo: Matrix,
    /// Expansion, `4E x E`.
    pub mlp_fc1: Matrix,
    /// Contraction, `E x 4E`.
    pub mlp_fc2: Matrix,
}

/// All named weight matrices of the model.
#[derive(Clone, Debug)]
pub struct ModelParams {
    /// Token embedding, `vocab x E`.
    pub wte: Matrix,
    /// Position embedding, `block_size x E`.
    pub wpe: Matrix,
    /// Output projection, `vocab x E`.
    pub lm_head: Matrix,
    pub layers: Vec<LayerParams>,
}

impl ModelParams {
    /// Allocates every matrix with Gaussian(0, `init_std`) entries.
    ///
    /// Allocation order: `wte, wpe, lm_head`, then per layer
    /// `attn_wq, attn_wk, attn_wv, attn_wo, mlp_fc1, mlp_fc2`.
    pub fn new(graph: &mut Graph, rng: &mut Prng, vocab_size: usize, config: &Config) -> Self {
        let e = config.n_embed;
        let hidden = config.mlp_hidden();
        let std = config.init_std;
        let mut matrix =
            |name: &str, rows, cols| Matrix::gaussian(graph, rng, name, rows, cols, std);

        let wte = matrix("wte", vocab_size, e);
        let wpe = matrix("wpe", config.block_size, e);
        let lm_head = matrix("lm_head", vocab_size, e);
        let layers = (0..config.n_layer)
            .map(|li| LayerParams {
                attn_wq: matrix(&format!("layer{li}.attn_wq"), e, e),
                attn_wk: matrix(&format!("layer{li}.attn_wk"), e, e),
                attn_wv: matrix(&format!("layer{li}.attn_wv"), e, e),
                attn_wo: matrix(&format!("layer{li}.attn_wo"), e, e),
                mlp_fc1: matrix(&format!("layer{li}.mlp_fc1"), hidden, e),
                mlp_fc2: matrix(&format!("layer{li}.mlp_fc2"), e, hidden),
            })
            .collect();

        ModelParams {
            wte,
            wpe,
            lm_head,
            layers,
        }
    }

    /// Every matrix with its qualified name, in allocation order.
    #[must_use]
    pub fn named_matrices(&self) -> Vec<(String, &Matrix)> {
        let mut out = vec![
            ("wte".to_string(), &self.wte),
            ("wpe".to_string(), &self.wpe),
            ("lm_head".to_string(), &self.lm_head),
        ];
        for (li, layer) in self.layers.iter().enumerate() {
            out.push((format!("layer{li}.attn_wq"), &layer.attn_wq));
            out.push((format!("layer{li}.attn_wk"), &layer.attn_wk));
            out.push((format!("layer{li}.attn_wv"), &layer.attn_wv));
            out.push((format!("layer{li}.attn_wo"), &layer.attn_wo));
            out.push((format!("layer{li}.mlp_fc1"), &layer.mlp_fc1));
            out.push((format!("layer{li}.mlp_fc2"), &layer.mlp_fc2));
        }
        out
    }

    /// Returns all parameters as a flat list (for the optimizer).
    #[must_use]
    pub fn params(&self) -> Vec<NodeId> {
        self.named_matrices()
            .into_iter()
            .flat_map(|(_, m)| m.ids().iter().copied())
            .collect()
    }
}
