//! Inference: start from BOS, sample the next token from the model, repeat until BOS or the context is full.

use tracing::debug;

use crate::error::EngineError;
use crate::model::{softmax_values_at, KvCache, ModelState};
use crate::tokenizer::Tokenizer;

/// One ranked next-token candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: usize,
    /// Character, or `"BOS"`.
    pub label: String,
    pub prob: f64,
}

/// What the sampler saw and chose at one position.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceStep {
    pub pos: usize,
    /// Full temperature-scaled distribution over the vocabulary.
    pub probs: Vec<f64>,
    pub chosen_id: usize,
    pub chosen_label: String,
    /// Most likely tokens, highest first, at most `top_k` of them.
    pub top_k: Vec<Candidate>,
}

/// A generated document and the steps that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub text: String,
    /// One entry per sampled token, including a final BOS if one stopped the sample.
    pub steps: Vec<InferenceStep>,
}

/// Samples one document.
///
/// Logits are divided by `temperature` before the softmax: below 1 sharpens
/// the distribution, above 1 flattens it. Each position consumes exactly one
/// PRNG draw. Parameters and moments are not modified.
///
/// # Errors
///
/// [`EngineError::InvalidTemperature`] unless `temperature` is finite and > 0.
pub fn generate(state: &mut ModelState, temperature: f64) -> Result<Sample, EngineError> {
    check_temperature(temperature)?;
    let result = sample_tokens(state, temperature);
    state.rewind();
    let sample = result?;
    debug!(text = %sample.text, len = sample.steps.len(), temperature, "sample");
    Ok(sample)
}

/// Samples `count` documents in sequence from the shared PRNG stream.
///
/// # Errors
///
/// [`EngineError::InvalidTemperature`] unless `temperature` is finite and > 0.
pub fn generate_many(
    state: &mut ModelState,
    temperature: f64,
    count: usize,
) -> Result<Vec<Sample>, EngineError> {
    check_temperature(temperature)?;
    (0..count).map(|_| generate(state, temperature)).collect()
}

fn check_temperature(temperature: f64) -> Result<(), EngineError> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidTemperature(temperature))
    }
}

fn sample_tokens(state: &mut ModelState, temperature: f64) -> Result<Sample, EngineError> {
    let bos = state.tokenizer.bos_id();
    let top_k = state.config.top_k;
    let mut cache = KvCache::new(state.config.n_layer);
    let mut token = bos;
    let mut text = String::new();
    let mut steps = Vec::new();

    for pos in 0..state.config.block_size {
        let logits = state.forward(token, pos, &mut cache)?;
        // Temperature: divide logits by T before softmax
        let probs = softmax_values_at(&state.graph.values(&logits), temperature);
        let chosen = state.rng.sample_categorical(&probs).unwrap_or(bos);

        steps.push(InferenceStep {
            pos,
            chosen_id: chosen,
            chosen_label: label(state, chosen),
            top_k: top_candidates(state, &probs, top_k),
            probs,
        });

        if chosen == bos {
            break;
        }
        text.extend(state.tokenizer.char_of(chosen));
        token = chosen;
    }
    Ok(Sample { text, steps })
}

fn label(state: &ModelState, id: usize) -> String {
    state.tokenizer.label(id).unwrap_or_default().to_string()
}

/// The `k` most likely ids, ties broken by lower id.
fn top_candidates(state: &ModelState, probs: &[f64], k: usize) -> Vec<Candidate> {
    let mut ranked: Vec<usize> = (0..probs.len()).collect();
    ranked.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    ranked
        .into_iter()
        .take(k)
        .map(|id| Candidate {
            id,
            label: label(state, id),
            prob: probs[id],
        })
        .collect()
}
