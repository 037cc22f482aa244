//! Build [`Config`] from environment variables.
//!
//! [`env_string`] and [`env_parsed`] read variables with typed errors
//! ([`ConfigError`]); key names live in the `constants` submodule.

use std::path::PathBuf;

use super::constants::{
    ENV_BETA1, ENV_BETA2, ENV_BLOCK_SIZE, ENV_EPSILON, ENV_INIT_STD, ENV_INPUT_PATH,
    ENV_LEARNING_RATE, ENV_LOSS_LOG_EVERY, ENV_NUM_STEPS, ENV_N_EMBED, ENV_N_HEAD, ENV_N_LAYER,
    ENV_PREFIX, ENV_RMSNORM_EPS, ENV_SAMPLE_SIZE, ENV_SEED, ENV_TEMPERATURE, ENV_TOP_K,
    ENV_UNKNOWN_CHARS,
};
use super::Config;
use super::ConfigError;
use crate::tokenizer::UnknownCharPolicy;

/// Returns the full environment variable key for a suffix (e.g. `SEED` → `MICROGPT_SEED`).
#[must_use]
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Reads an environment variable as a string.
///
/// Returns `Ok(None)` if unset, and `Err(ConfigError::EnvVar)` if set but not valid Unicode.
pub fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(s) => Ok(Some(s)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVar {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads an environment variable and parses it into `T`.
///
/// Returns `Ok(None)` if unset and `Err(ConfigError::Parse)` if set but unparsable.
pub fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(s) = env_string(key)? else {
        return Ok(None);
    };
    let parsed = s.trim().parse::<T>();
    match parsed {
        Ok(t) => Ok(Some(t)),
        Err(e) => Err(ConfigError::Parse {
            key: key.to_string(),
            message: e.to_string(),
            value: s,
        }),
    }
}

/// Builds [`Config`] from `MICROGPT_*` variables, falling back to [`Config::default`].
///
/// Only parsing is checked here; call [`Config::validate`] for the value rules.
pub fn from_env() -> Result<Config, ConfigError> {
    let default = Config::default();

    let seed = env_parsed::<u64>(&env_key(ENV_SEED))?.unwrap_or(default.seed);
    let input_path = env_string(&env_key(ENV_INPUT_PATH))?
        .map(PathBuf::from)
        .unwrap_or_else(|| default.input_path.clone());
    let n_embed = env_parsed::<usize>(&env_key(ENV_N_EMBED))?.unwrap_or(default.n_embed);
    let n_head = env_parsed::<usize>(&env_key(ENV_N_HEAD))?.unwrap_or(default.n_head);
    let n_layer = env_parsed::<usize>(&env_key(ENV_N_LAYER))?.unwrap_or(default.n_layer);
    let block_size = env_parsed::<usize>(&env_key(ENV_BLOCK_SIZE))?.unwrap_or(default.block_size);
    let init_std = env_parsed::<f64>(&env_key(ENV_INIT_STD))?.unwrap_or(default.init_std);
    let rmsnorm_eps = env_parsed::<f64>(&env_key(ENV_RMSNORM_EPS))?.unwrap_or(default.rmsnorm_eps);
    let learning_rate =
        env_parsed::<f64>(&env_key(ENV_LEARNING_RATE))?.unwrap_or(default.learning_rate);
    let beta1 = env_parsed::<f64>(&env_key(ENV_BETA1))?.unwrap_or(default.beta1);
    let beta2 = env_parsed::<f64>(&env_key(ENV_BETA2))?.unwrap_or(default.beta2);
    let epsilon = env_parsed::<f64>(&env_key(ENV_EPSILON))?.unwrap_or(default.epsilon);
    let num_steps = env_parsed::<usize>(&env_key(ENV_NUM_STEPS))?.unwrap_or(default.num_steps);
    let loss_log_every =
        env_parsed::<usize>(&env_key(ENV_LOSS_LOG_EVERY))?.unwrap_or(default.loss_log_every);
    let temperature = env_parsed::<f64>(&env_key(ENV_TEMPERATURE))?.unwrap_or(default.temperature);
    let sample_size =
        env_parsed::<usize>(&env_key(ENV_SAMPLE_SIZE))?.unwrap_or(default.sample_size);
    let top_k = env_parsed::<usize>(&env_key(ENV_TOP_K))?.unwrap_or(default.top_k);
    let unknown_chars = env_parsed::<UnknownCharPolicy>(&env_key(ENV_UNKNOWN_CHARS))?
        .unwrap_or(default.unknown_chars);

    Ok(Config {
        seed,
        input_path,
        n_embed,
        n_head,
        n_layer,
        block_size,
        init_std,
        rmsnorm_eps,
        learning_rate,
        beta1,
        beta2,
        epsilon,
        num_steps,
        loss_log_every,
        temperature,
        sample_size,
        top_k,
        unknown_chars,
    })
}
