//! One training step: document → forward → cross-entropy → backward → Adam.

use tracing::{debug, warn};

use crate::autograd::NodeId;
use crate::error::EngineError;
use crate::model::{softmax, KvCache, ModelState};

/// What one step trained on and how it went.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainStepResult {
    /// Mean cross-entropy over the trained positions.
    pub loss: f64,
    /// The document this step used.
    pub document: String,
    /// Learning rate applied by this step.
    pub learning_rate: f64,
    /// `[BOS, ...document..., BOS]`.
    pub tokens: Vec<usize>,
    /// `-log p(target)` at each trained position.
    pub per_position_loss: Vec<f64>,
}

/// Linearly decayed learning rate: `lr0 * max(0, 1 - step / total)`.
#[must_use]
pub fn learning_rate(lr0: f64, step: usize, total_target_steps: usize) -> f64 {
    lr0 * (1.0 - step as f64 / total_target_steps as f64).max(0.0)
}

/// Trains on the next document and applies one Adam update.
///
/// Documents are visited in round-robin order (`docs[step % docs.len()]`),
/// and the first `min(block_size, tokens.len() - 1)` next-token predictions
/// are averaged into the loss. `total_target_steps` is the horizon over which
/// the learning rate decays to 0; steps beyond it train with a rate of 0.
///
/// # Errors
///
/// - [`EngineError::InvalidTargetSteps`] if `total_target_steps` is 0.
/// - [`EngineError::NonFiniteLoss`] if the loss is NaN or infinite. No
///   parameter, moment, counter or history entry is changed in that case.
/// - [`EngineError::Tokenizer`] if the document cannot be encoded.
pub fn train_step(
    state: &mut ModelState,
    total_target_steps: usize,
) -> Result<TrainStepResult, EngineError> {
    if total_target_steps == 0 {
        return Err(EngineError::InvalidTargetSteps);
    }

    let step = state.step;
    let document = state.docs[step % state.docs.len()].clone();
    let tokens = state.tokenizer.tokenize(&document)?;
    let n = state.config.block_size.min(tokens.len() - 1);

    let forward = sequence_loss(state, &tokens, n);
    let (loss, position_losses) = match forward {
        Ok(nodes) => nodes,
        Err(e) => {
            state.rewind();
            return Err(e);
        }
    };

    let loss_value = state.graph.value(loss);
    if !loss_value.is_finite() {
        state.rewind();
        warn!(step, loss = loss_value, %document, "non-finite loss, update skipped");
        return Err(EngineError::NonFiniteLoss {
            step,
            loss: loss_value,
        });
    }
    let per_position_loss = state.graph.values(&position_losses);

    // Backward: every parameter gets its gradient
    state.graph.backward(loss);

    let lr = learning_rate(state.config.learning_rate, step, total_target_steps);
    state
        .optimizer
        .step(&mut state.graph, &state.params, lr, step + 1);

    state.rewind();
    state.step += 1;
    state.loss_history.push(loss_value);
    debug!(step = step + 1, loss = loss_value, lr, %document, "train step");

    Ok(TrainStepResult {
        loss: loss_value,
        document,
        learning_rate: lr,
        tokens,
        per_position_loss,
    })
}

/// Builds the mean next-token loss over the first `n` positions.
/// Returns the loss node and the per-position loss nodes.
fn sequence_loss(
    state: &mut ModelState,
    tokens: &[usize],
    n: usize,
) -> Result<(NodeId, Vec<NodeId>), EngineError> {
    let mut cache = KvCache::new(state.config.n_layer);
    let mut losses = Vec::with_capacity(n);
    for pos in 0..n {
        let (token, target) = (tokens[pos], tokens[pos + 1]);
        let logits = state.forward(token, pos, &mut cache)?;
        let graph = &mut state.graph;
        let probs = softmax(graph, &logits);
        let log_p = graph.log(probs[target]);
        losses.push(graph.neg(log_p));
    }
    let graph = &mut state.graph;
    let total = graph.sum(&losses);
    let count = graph.constant(n as f64);
    Ok((graph.div(total, count), losses))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;
    use crate::data::Corpus;
    use crate::tokenizer::Tokenizer;

    fn small_config() -> Config {
        Config {
            n_embed: 8,
            n_head: 2,
            block_size: 8,
            ..Config::default()
        }
    }

    fn model(docs: &[&str]) -> ModelState {
        let corpus = Corpus::from_docs(docs).unwrap();
        ModelState::new(&corpus, small_config()).unwrap()
    }

    #[test]
    fn learning_rate_decays_linearly_and_clamps_at_zero() {
        assert_eq!(learning_rate(0.01, 0, 100), 0.01);
        assert!((learning_rate(0.01, 50, 100) - 0.005).abs() < 1e-15);
        assert_eq!(learning_rate(0.01, 100, 100), 0.0);
        assert_eq!(learning_rate(0.01, 250, 100), 0.0);
    }

    #[test]
    fn step_reports_document_tokens_and_losses() {
        let mut state = model(&["ab"]);
        let res = train_step(&mut state, 10).unwrap();
        let bos = state.tokenizer().bos_id();
        assert_eq!(res.document, "ab");
        assert_eq!(res.tokens, vec![bos, 0, 1, bos]);
        assert_eq!(res.per_position_loss.len(), 3);
        let mean = res.per_position_loss.iter().sum::<f64>() / 3.0;
        assert!((mean - res.loss).abs() < 1e-12);
        assert_eq!(res.learning_rate, 0.01);
        assert_eq!(state.step(), 1);
        assert_eq!(state.loss_history(), [res.loss]);
    }

    #[test]
    fn initial_loss_is_close_to_uniform_guess() {
        let mut state = model(&["abc", "cab"]);
        let res = train_step(&mut state, 10).unwrap();
        // Small init gives near-uniform predictions over 4 tokens.
        assert!((res.loss - 4f64.ln()).abs() < 0.5, "loss {}", res.loss);
    }

    #[test]
    fn long_document_is_truncated_to_block_size() {
        let mut state = model(&["abcdefghijklmnop"]);
        let res = train_step(&mut state, 10).unwrap();
        assert_eq!(res.tokens.len(), 18);
        assert_eq!(res.per_position_loss.len(), 8);
    }

    #[test]
    fn step_rewinds_graph_and_clears_gradients() {
        let mut state = model(&["emma", "anna"]);
        let base_len = state.graph().len();
        train_step(&mut state, 10).unwrap();
        assert_eq!(state.graph().len(), base_len);
        assert!(state.params().iter().all(|&p| state.graph().grad(p) == 0.0));
        assert!(state.adam_v().iter().any(|&v| v > 0.0));
    }

    #[test]
    fn step_changes_parameters() {
        let mut state = model(&["emma"]);
        let before = state.param_values();
        train_step(&mut state, 10).unwrap();
        assert_ne!(before, state.param_values());
    }

    #[test]
    fn zero_target_steps_is_rejected_without_side_effects() {
        let mut state = model(&["emma"]);
        let before = state.param_values();
        let err = train_step(&mut state, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTargetSteps));
        assert_eq!(state.step(), 0);
        assert_eq!(before, state.param_values());
    }

    #[test]
    fn non_finite_loss_leaves_state_untouched() {
        let mut state = model(&["ab"]);
        // Logits `r * 1e6 * sum(x)` push every non-max token's probability to 0.
        let head = state.weights().lm_head.clone();
        for r in 0..head.rows() {
            for &id in head.row(r) {
                state.graph.set_value(id, r as f64 * 1e6);
            }
        }
        let before = state.param_values();
        let base_len = state.graph().len();
        let err = train_step(&mut state, 10).unwrap_err();
        assert!(matches!(err, EngineError::NonFiniteLoss { step: 0, .. }));
        assert_eq!(state.step(), 0);
        assert!(state.loss_history().is_empty());
        assert_eq!(before, state.param_values());
        assert!(state.adam_m().iter().all(|&m| m == 0.0));
        assert_eq!(state.graph().len(), base_len);
    }
}
