use std::process::ExitCode;

use clap::Parser;
use tracing::{info, span, Level};
use tracing_subscriber::EnvFilter;

use crate::model::outcome::show_error;

mod adapters;
mod cli;
mod model;
mod session;
mod tasks;
mod util;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let cli = cli::Cli::parse();
    info!(region = %cli.region, endpoint_url = ?cli.endpoint_url, "args");

    let config = match cli.sdk_config() {
        Err(err) => {
            show_error(&err, "config");
            return ExitCode::FAILURE;
        }
        Ok(config) => config,
    };
    let connector = adapters::s3::S3Connector::new(config, cli.endpoint_url.is_some());

    let task = match cli.into_task() {
        Err(err) => {
            show_error(&err, "args");
            return ExitCode::FAILURE;
        }
        Ok(task) => task,
    };

    let outcome = tasks::run_task(&connector, task.as_ref());
    info!(outcome = %outcome, "finished");

    if outcome.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
