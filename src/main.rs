// ABOUTME: Entry point for the deckhand CLI application.
// ABOUTME: Resolves configuration once, runs the pipeline, exits non-zero naming the failed stage.

use std::env;
use std::path::Path;

use clap::Parser;
use deckhand::cli::Cli;
use deckhand::config::{RunConfig, Settings};
use deckhand::error::Result;
use deckhand::exec::SystemRunner;
use deckhand::health::HttpProbe;
use deckhand::orchestrator::Orchestrator;
use deckhand::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());
    output.start_timer();

    if let Err(e) = run(&cli, &output).await {
        match output.mode() {
            OutputMode::Json => output.error(&e.report()),
            _ => eprintln!("Error: {}", e.report()),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, output: &Output) -> Result<()> {
    let project_dir = env::current_dir()?;
    let config = load_config(cli, &project_dir)?;
    tracing::debug!(?config, "resolved run configuration");

    let runner = SystemRunner::new(project_dir.clone());
    let orchestrator = Orchestrator::new(&config, &runner, HttpProbe::new(), output);
    let report = orchestrator.run().await?;

    output.success(&format!(
        "Deployed {} to {} ({} environment)",
        report.image, config.target, config.environment
    ));
    Ok(())
}

fn load_config(cli: &Cli, project_dir: &Path) -> Result<RunConfig> {
    let settings = match &cli.config {
        Some(path) => Settings::load(&project_dir.join(path))?,
        None => Settings::discover(project_dir)?,
    };
    RunConfig::resolve(cli.options(), settings, project_dir)
}
