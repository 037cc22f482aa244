//! Trains the model on a list of names, then samples new ones.
//!
//! Configuration comes from `MICROGPT_*` environment variables; the corpus is
//! read from `MICROGPT_INPUT_PATH` and falls back to `demos/data/names.txt`.
//! Set `RUST_LOG=debug` to see every step.
//!
//! ```text
//! cargo run --release --example train_names
//! ```

use std::path::{Path, PathBuf};

use microgpt_engine::config::from_env;
use microgpt_engine::data::load_from_path;
use microgpt_engine::{generate_many, train_step, ModelState};
use tracing_subscriber::EnvFilter;

fn corpus_path(configured: &Path) -> PathBuf {
    if configured.exists() {
        configured.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/data/names.txt")
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = from_env()?;
    let path = corpus_path(&config.input_path);
    let corpus = load_from_path(&path)?;
    println!("num docs: {}", corpus.len());

    let num_steps = config.num_steps;
    let log_every = config.loss_log_every.max(1);
    let temperature = config.temperature;
    let sample_size = config.sample_size;

    let mut state = ModelState::new(&corpus, config)?;
    println!("vocab size: {}", state.vocab_size());
    println!("num params: {}", state.params().len());

    for step in 0..num_steps {
        let res = train_step(&mut state, num_steps)?;
        if (step + 1) % log_every == 0 || step == 0 {
            println!(
                "step {:4} / {:4} | loss {:.4} | lr {:.5} | {}",
                step + 1,
                num_steps,
                res.loss,
                res.learning_rate,
                res.document
            );
        }
    }

    println!("\n--- inference (new, hallucinated names) ---");
    for (i, sample) in generate_many(&mut state, temperature, sample_size)?
        .iter()
        .enumerate()
    {
        println!("sample {:2}: {}", i + 1, sample.text);
    }

    Ok(())
}
