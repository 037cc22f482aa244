//! Configuration for model shape, optimizer, sampling, and the demo runner.
//!
//! Load from environment via [`from_env`] and validate with [`Config::validate`].
//! Default values and env key names are centralized in the `constants` submodule.

mod builder;
mod constants;
mod error;

use std::path::PathBuf;

use constants::{
    DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_BLOCK_SIZE, DEFAULT_EPSILON, DEFAULT_INIT_STD,
    DEFAULT_INPUT_PATH, DEFAULT_LEARNING_RATE, DEFAULT_LOSS_LOG_EVERY, DEFAULT_NUM_STEPS,
    DEFAULT_N_EMBED, DEFAULT_N_HEAD, DEFAULT_N_LAYER, DEFAULT_RMSNORM_EPS, DEFAULT_SAMPLE_SIZE,
    DEFAULT_SEED, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, MLP_RATIO,
};

pub use builder::{env_key, env_parsed, env_string, from_env};
pub use error::ConfigError;

use crate::tokenizer::UnknownCharPolicy;

/// Central configuration.
///
/// Holds model dimensions, optimizer and sampling parameters, and the demo's
/// input path. Model construction validates it; invalid values never reach the
/// forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Seed for the PRNG (initialization, shuffling, sampling).
    pub seed: u64,
    /// Path to an input corpus (one document per line).
    pub input_path: PathBuf,

    /// Embedding dimension (must be divisible by `n_head`).
    pub n_embed: usize,
    /// Number of attention heads.
    pub n_head: usize,
    /// Number of transformer layers.
    pub n_layer: usize,
    /// Maximum context length (tokens).
    pub block_size: usize,

    /// Weight init standard deviation.
    pub init_std: f64,
    /// RMSNorm epsilon.
    pub rmsnorm_eps: f64,

    /// Initial Adam learning rate; decays linearly to 0.
    pub learning_rate: f64,
    /// Adam first-moment decay.
    pub beta1: f64,
    /// Adam second-moment decay.
    pub beta2: f64,
    /// Adam epsilon.
    pub epsilon: f64,

    /// Number of training steps (the decay horizon).
    pub num_steps: usize,
    /// Log loss every this many steps.
    pub loss_log_every: usize,

    /// Sampling temperature (> 0).
    pub temperature: f64,
    /// Number of samples to generate after training.
    pub sample_size: usize,
    /// Number of top candidates reported per generated position.
    pub top_k: usize,
    /// What the tokenizer does with characters missing from the vocabulary.
    pub unknown_chars: UnknownCharPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            n_embed: DEFAULT_N_EMBED,
            n_head: DEFAULT_N_HEAD,
            n_layer: DEFAULT_N_LAYER,
            block_size: DEFAULT_BLOCK_SIZE,
            init_std: DEFAULT_INIT_STD,
            rmsnorm_eps: DEFAULT_RMSNORM_EPS,
            learning_rate: DEFAULT_LEARNING_RATE,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            num_steps: DEFAULT_NUM_STEPS,
            loss_log_every: DEFAULT_LOSS_LOG_EVERY,
            temperature: DEFAULT_TEMPERATURE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            top_k: DEFAULT_TOP_K,
            unknown_chars: UnknownCharPolicy::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.into()))
}

impl Config {
    /// Validates configuration. Returns `Ok(())` if valid, or a [`ConfigError::Validation`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_head == 0 {
            return invalid("n_head must be greater than 0");
        }
        if self.n_embed == 0 {
            return invalid("n_embed must be greater than 0");
        }
        if !self.n_embed.is_multiple_of(self.n_head) {
            return invalid(format!(
                "n_embed ({}) must be divisible by n_head ({})",
                self.n_embed, self.n_head
            ));
        }
        if self.n_layer == 0 {
            return invalid("n_layer must be greater than 0");
        }
        if self.block_size == 0 {
            return invalid("block_size must be greater than 0");
        }
        if !(self.init_std.is_finite() && self.init_std >= 0.0) {
            return invalid(format!("init_std ({}) must be finite and >= 0", self.init_std));
        }
        if !(self.rmsnorm_eps.is_finite() && self.rmsnorm_eps > 0.0) {
            return invalid(format!("rmsnorm_eps ({}) must be > 0", self.rmsnorm_eps));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate >= 0.0) {
            return invalid(format!(
                "learning_rate ({}) must be finite and >= 0",
                self.learning_rate
            ));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return invalid(format!("{name} ({beta}) must be in [0, 1)"));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid(format!("epsilon ({}) must be > 0", self.epsilon));
        }
        if self.num_steps == 0 {
            return invalid("num_steps must be greater than 0");
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return invalid(format!(
                "temperature ({}) must be finite and > 0",
                self.temperature
            ));
        }
        if self.top_k == 0 {
            return invalid("top_k must be greater than 0");
        }
        Ok(())
    }

    /// Head dimension (n_embed / n_head).
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.n_embed / self.n_head
    }

    /// Width of the MLP hidden layer (4 * n_embed).
    #[must_use]
    pub fn mlp_hidden(&self) -> usize {
        MLP_RATIO * self.n_embed
    }

    /// Number of scalar parameters for a vocabulary of `vocab_size` tokens:
    /// `2*V*E + B*E + L*12*E^2`.
    #[must_use]
    pub fn param_count(&self, vocab_size: usize) -> usize {
        let e = self.n_embed;
        let per_layer = 4 * e * e + 2 * self.mlp_hidden() * e;
        2 * vocab_size * e + self.block_size * e + self.n_layer * per_layer
    }
}
