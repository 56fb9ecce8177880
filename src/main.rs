mod cli;
mod constants;
mod entity;
mod errors;
mod host;
mod linux;
mod manifest;
mod prompt;
mod provision;
mod run;
mod sanity;
mod utils;
mod zfs;

use std::error::Error;
use std::process::exit;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::errors::ProvError;

fn main() {
    let layer = fmt::layer().compact().with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    let args = cli::Cli::parse();

    if let Err(err) = run::run(args) {
        report_error(&err);
        exit(1);
    }

    exit(0)
}

fn report_error(err: &ProvError) {
    error!("{err}");

    if let ProvError::ApplyError {
        action_failed,
        actions_performed,
        ..
    } = err
    {
        eprintln!("failed action: {}", serde_json::json!(action_failed));
        eprintln!("actions performed: {}", serde_json::json!(actions_performed));
    }

    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = cause.source();
    }
}
