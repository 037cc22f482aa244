//! # microgpt-engine
//!
//! A tiny character-level GPT trained from scratch on scalar autograd: every
//! number in the forward pass, the backward pass and the Adam update is a node
//! you can inspect.
//!
//! ```no_run
//! use microgpt_engine::{generate, train_step, Config, Corpus, ModelState};
//!
//! # fn main() -> Result<(), microgpt_engine::EngineError> {
//! let corpus = Corpus::from_docs(["emma", "olivia", "ava"])?;
//! let mut state = ModelState::new(&corpus, Config::default())?;
//! for _ in 0..100 {
//!     train_step(&mut state, 100)?;
//! }
//! let sample = generate(&mut state, 0.5)?;
//! println!("{}", sample.text);
//! # Ok(())
//! # }
//! ```

pub mod autograd;
pub mod config;
pub mod data;
mod error;
mod generate;
pub mod model;
pub mod optim;
pub mod random;
pub mod tokenizer;
mod train;

pub use config::{Config, ConfigError};
pub use data::{Corpus, DataError};
pub use error::EngineError;
pub use generate::{generate, generate_many, Candidate, InferenceStep, Sample};
pub use model::{forward_trace, trace_sequence, ForwardTrace, LayerTrace, ModelState};
pub use train::{learning_rate, train_step, TrainStepResult};
