#![warn(clippy::unwrap_used, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::doc_markdown,
    clippy::neg_cmp_op_on_partial_ord
)]
use std::{
    io::{self, Write},
    path::PathBuf,
};

use color_eyre::eyre;
use config::{Config, DEFAULT_CONFIG_PATH};
use console::Console;
use environment::Environment;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod console;
mod environment;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = Config::load(&config_path)?;

    let mut env = Environment::default();
    config.apply(&mut env)?;
    info!(?env, "environment ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    Console::new(&mut env, stdin.lock(), stdout.lock()).run()?;
    stdout.flush()?;
    Ok(())
}
