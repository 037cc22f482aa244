//! The model: parameters, forward pass, and the state that training and sampling share.
//!
//! [`ModelState`] owns everything that changes while learning (parameter
//! values, Adam moments, step counter, loss history, PRNG). Training and
//! generation take it by `&mut`; there is no global state.

mod forward;
mod layers;
mod params;

use tracing::info;

use crate::autograd::{Graph, GraphMark, NodeId};
use crate::config::Config;
use crate::data::Corpus;
use crate::error::EngineError;
use crate::optim::Adam;
use crate::random::Prng;
use crate::tokenizer::{CharTokenizer, Tokenizer};

use forward::{gpt_forward, gpt_forward_traced};
pub use forward::{ForwardTrace, KvCache, LayerTrace};
pub use layers::{dot, linear, rmsnorm, softmax, softmax_values, softmax_values_at};
pub use params::{LayerParams, Matrix, ModelParams};

/// Complete training and inference state of one model.
#[derive(Clone, Debug)]
pub struct ModelState {
    pub(crate) config: Config,
    pub(crate) tokenizer: CharTokenizer,
    pub(crate) graph: Graph,
    pub(crate) weights: ModelParams,
    pub(crate) params: Vec<NodeId>,
    pub(crate) optimizer: Adam,
    pub(crate) step: usize,
    pub(crate) loss_history: Vec<f64>,
    pub(crate) docs: Vec<String>,
    pub(crate) rng: Prng,
    /// Arena size right after parameter allocation; every step rewinds here.
    pub(crate) base: GraphMark,
}

impl ModelState {
    /// Builds a fresh model for `corpus`.
    ///
    /// Seeds the PRNG from `config.seed`, shuffles the documents, builds the
    /// vocabulary and initializes every parameter. The result depends only on
    /// the corpus and the config.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if the configuration does not validate.
    pub fn new(corpus: &Corpus, config: Config) -> Result<Self, EngineError> {
        config.validate()?;

        let mut rng = Prng::new(config.seed);
        let mut docs: Vec<String> = corpus.lines().into_iter().map(str::to_owned).collect();
        rng.shuffle(&mut docs);

        let tokenizer =
            CharTokenizer::from_corpus(&docs).with_unknown_policy(config.unknown_chars);
        let vocab_size = tokenizer.vocab_size();

        let mut graph = Graph::new();
        let weights = ModelParams::new(&mut graph, &mut rng, vocab_size, &config);
        let params = weights.params();
        let optimizer = Adam::new(params.len(), &config);
        let base = graph.mark();

        info!(
            num_docs = docs.len(),
            vocab_size,
            num_params = params.len(),
            seed = config.seed,
            "model created"
        );

        Ok(ModelState {
            config,
            tokenizer,
            graph,
            weights,
            params,
            optimizer,
            step: 0,
            loss_history: Vec::new(),
            docs,
            rng,
            base,
        })
    }

    /// Runs one position through the model, extending `cache`.
    ///
    /// Intermediate nodes stay in the graph until the caller rewinds it.
    ///
    /// # Errors
    ///
    /// [`EngineError::TokenOutOfRange`] or [`EngineError::PositionOutOfRange`].
    pub(crate) fn forward(
        &mut self,
        token: usize,
        pos: usize,
        cache: &mut KvCache,
    ) -> Result<Vec<NodeId>, EngineError> {
        self.check_token(token)?;
        self.check_position(pos)?;
        Ok(gpt_forward(
            &mut self.graph,
            &self.weights,
            &self.config,
            token,
            pos,
            cache,
        ))
    }

    fn check_token(&self, id: usize) -> Result<(), EngineError> {
        let vocab_size = self.tokenizer.vocab_size();
        if id >= vocab_size {
            return Err(EngineError::TokenOutOfRange { id, vocab_size });
        }
        Ok(())
    }

    fn check_position(&self, pos: usize) -> Result<(), EngineError> {
        if pos >= self.config.block_size {
            return Err(EngineError::PositionOutOfRange {
                pos,
                block_size: self.config.block_size,
            });
        }
        Ok(())
    }

    /// Drops every node created since parameter allocation.
    pub(crate) fn rewind(&mut self) {
        self.graph.rewind(self.base);
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn tokenizer(&self) -> &CharTokenizer {
        &self.tokenizer
    }

    /// Read-only view of the node arena (parameter values and gradients).
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Named weight matrices.
    #[must_use]
    pub fn weights(&self) -> &ModelParams {
        &self.weights
    }

    /// Flat parameter list, in allocation order.
    #[must_use]
    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    /// Current parameter values, aligned with [`params`](Self::params).
    #[must_use]
    pub fn param_values(&self) -> Vec<f64> {
        self.graph.values(&self.params)
    }

    /// Adam first moments, aligned with [`params`](Self::params).
    #[must_use]
    pub fn adam_m(&self) -> &[f64] {
        self.optimizer.m()
    }

    /// Adam second moments, aligned with [`params`](Self::params).
    #[must_use]
    pub fn adam_v(&self) -> &[f64] {
        self.optimizer.v()
    }

    /// Number of completed training steps.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Loss of every completed step, oldest first.
    #[must_use]
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Training documents in their shuffled order.
    #[must_use]
    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.vocab_size()
    }
}

/// Traces a single token at a single position with a fresh cache.
///
/// Parameters, moments and the PRNG are untouched; the graph is rewound afterwards.
///
/// # Errors
///
/// [`EngineError::TokenOutOfRange`] or [`EngineError::PositionOutOfRange`].
pub fn forward_trace(
    state: &mut ModelState,
    token_id: usize,
    position_id: usize,
) -> Result<ForwardTrace, EngineError> {
    let mut traces = trace_tokens(state, &[token_id], position_id)?;
    Ok(traces.remove(0))
}

/// Traces every position of `tokens` through one shared cache, so position
/// `t` attends over positions `0..=t`.
///
/// # Errors
///
/// Fails before running anything if a token is out of range or the sequence
/// is longer than `block_size`.
pub fn trace_sequence(
    state: &mut ModelState,
    tokens: &[usize],
) -> Result<Vec<ForwardTrace>, EngineError> {
    trace_tokens(state, tokens, 0)
}

fn trace_tokens(
    state: &mut ModelState,
    tokens: &[usize],
    first_pos: usize,
) -> Result<Vec<ForwardTrace>, EngineError> {
    for &id in tokens {
        state.check_token(id)?;
    }
    if let Some(extra) = tokens.len().checked_sub(1) {
        state.check_position(first_pos + extra)?;
    }

    let mut cache = KvCache::new(state.config.n_layer);
    let mut traces = Vec::with_capacity(tokens.len());
    for (offset, &id) in tokens.iter().enumerate() {
        let (_, trace) = gpt_forward_traced(
            &mut state.graph,
            &state.weights,
            &state.config,
            id,
            first_pos + offset,
            &mut cache,
        );
        traces.push(trace);
    }
    state.rewind();
    Ok(traces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Corpus {
        Corpus::from_docs(["emma", "olivia", "ava", "isabella", "sophia"]).unwrap()
    }

    fn small() -> Config {
        Config {
            n_embed: 8,
            n_head: 2,
            block_size: 8,
            ..Config::default()
        }
    }

    #[test]
    fn param_count_matches_closed_form() {
        let alphabet: String = ('a'..='z').collect();
        let corpus = Corpus::from_docs([alphabet]).unwrap();
        let state = ModelState::new(&corpus, Config::default()).unwrap();
        assert_eq!(state.vocab_size(), 27);
        assert_eq!(state.params().len(), 4192);
        assert_eq!(state.params().len(), state.config().param_count(27));
        assert_eq!(state.adam_m().len(), 4192);
        assert_eq!(state.adam_v().len(), 4192);
    }

    #[test]
    fn params_follow_allocation_order_and_are_labelled() {
        let state = ModelState::new(&names(), small()).unwrap();
        let names: Vec<String> = state
            .weights()
            .named_matrices()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(
            names,
            [
                "wte",
                "wpe",
                "lm_head",
                "layer0.attn_wq",
                "layer0.attn_wk",
                "layer0.attn_wv",
                "layer0.attn_wo",
                "layer0.mlp_fc1",
                "layer0.mlp_fc2",
            ]
        );
        let params = state.params();
        assert!(params.windows(2).all(|w| w[0].index() + 1 == w[1].index()));
        assert_eq!(state.graph().label(params[0]), Some("wte[0][0]"));
        let fc1 = &state.weights().layers[0].mlp_fc1;
        assert_eq!((fc1.rows(), fc1.cols()), (32, 8));
    }

    #[test]
    fn creation_is_deterministic_per_seed() {
        let a = ModelState::new(&names(), small()).unwrap();
        let b = ModelState::new(&names(), small()).unwrap();
        assert_eq!(a.param_values(), b.param_values());
        assert_eq!(a.docs(), b.docs());
        let c = ModelState::new(
            &names(),
            Config {
                seed: 7,
                ..small()
            },
        )
        .unwrap();
        assert_ne!(a.param_values(), c.param_values());
    }

    #[test]
    fn docs_are_a_permutation_of_the_corpus() {
        let state = ModelState::new(&names(), small()).unwrap();
        let mut docs = state.docs().to_vec();
        docs.sort();
        assert_eq!(docs, ["ava", "emma", "isabella", "olivia", "sophia"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = Config {
            n_embed: 10,
            n_head: 4,
            ..Config::default()
        };
        assert!(matches!(
            ModelState::new(&names(), cfg),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn forward_trace_has_every_intermediate() {
        let mut state = ModelState::new(&names(), small()).unwrap();
        let bos = state.tokenizer().bos_id();
        let before = state.param_values();
        let trace = forward_trace(&mut state, bos, 3).unwrap();

        assert_eq!((trace.token_id, trace.pos_id), (bos, 3));
        assert_eq!(trace.tok_emb.len(), 8);
        for j in 0..8 {
            assert_eq!(trace.combined[j], trace.tok_emb[j] + trace.pos_emb[j]);
        }
        let layer = &trace.layers[0];
        assert_eq!(layer.q.len(), 8);
        // A fresh cache holds one position, so each head attends fully to it.
        assert_eq!(layer.attn_weights, vec![vec![1.0]; 2]);
        assert_eq!(layer.mlp_hidden.len(), 32);
        for (h, &active) in layer.mlp_hidden.iter().zip(&layer.mlp_active) {
            assert_eq!(active, *h > 0.0);
        }
        assert_eq!(trace.logits.len(), state.vocab_size());
        assert!((trace.probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        assert_eq!(before, state.param_values());
        assert_eq!(state.graph().len(), state.params().len());
    }

    #[test]
    fn forward_trace_rejects_out_of_range_inputs() {
        let mut state = ModelState::new(&names(), small()).unwrap();
        let vocab_size = state.vocab_size();
        assert!(matches!(
            forward_trace(&mut state, vocab_size, 0),
            Err(EngineError::TokenOutOfRange { .. })
        ));
        assert!(matches!(
            forward_trace(&mut state, 0, 8),
            Err(EngineError::PositionOutOfRange { pos: 8, block_size: 8 })
        ));
        assert_eq!(state.graph().len(), state.params().len());
    }

    #[test]
    fn trace_sequence_grows_attention_over_time() {
        let mut state = ModelState::new(&names(), small()).unwrap();
        let tokens = state.tokenizer().tokenize("ava").unwrap();
        let traces = trace_sequence(&mut state, &tokens).unwrap();
        assert_eq!(traces.len(), tokens.len());
        for (t, trace) in traces.iter().enumerate() {
            assert_eq!(trace.pos_id, t);
            for head in &trace.layers[0].attn_weights {
                assert_eq!(head.len(), t + 1);
                assert!((head.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
        // Position 0 sees the same context either way.
        let single = forward_trace(&mut state, tokens[0], 0).unwrap();
        assert_eq!(single, traces[0]);

        let too_long = vec![0; 9];
        assert!(matches!(
            trace_sequence(&mut state, &too_long),
            Err(EngineError::PositionOutOfRange { pos: 8, .. })
        ));
        assert!(trace_sequence(&mut state, &[]).unwrap().is_empty());
    }

    #[test]
    fn trace_sequence_rejects_bad_tokens_before_running() {
        let mut state = ModelState::new(&names(), small()).unwrap();
        let vocab_size = state.vocab_size();
        let base_len = state.graph().len();
        assert!(matches!(
            trace_sequence(&mut state, &[0, vocab_size + 3, 1]),
            Err(EngineError::TokenOutOfRange { id, .. }) if id == vocab_size + 3
        ));
        assert!(matches!(
            forward_trace(&mut state, usize::MAX, usize::MAX),
            Err(EngineError::TokenOutOfRange { .. })
        ));
        assert_eq!(state.graph().len(), base_len);
    }

    #[test]
    fn kv_cache_grows_one_entry_per_call() {
        let mut state = ModelState::new(&names(), small()).unwrap();
        let mut cache = KvCache::new(1);
        assert!(cache.is_empty());
        for pos in 0..3 {
            state.forward(0, pos, &mut cache).unwrap();
        }
        assert_eq!(cache.len(), 3);
        state.rewind();
    }
}
