use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dropmat::{ConfigError, DropSource, Materializer, RunMetrics};
use dropmat_fetch::{Fetcher, ReqwestClient};
use dropmat_manifest::RestManifestProvider;

use crate::cli::Cli;

mod cli;

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let materializer = match prepare(&cli).await {
        Ok(materializer) => materializer,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&cli, &materializer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

/// Everything that can fail before the first byte is written.
async fn prepare(cli: &Cli) -> Result<Materializer<ReqwestClient>> {
    let source = DropSource::parse(&cli.drop_url, cli.root.as_deref()).context("invalid drop URL")?;
    tracing::debug!(drop = %source.url, root = %source.root, "resolved drop source");

    let provider = RestManifestProvider::new(cli.token.clone()).map_err(ConfigError::from)?;
    let client = ReqwestClient::new().map_err(ConfigError::Client)?;
    let fetcher = Fetcher::new(client).with_policy(cli.retry_policy());

    let materializer = Materializer::open(&provider, &source, fetcher)
        .await
        .context("not able to get drop manifest, check the drop URL")?;
    Ok(materializer.with_options(cli.options()))
}

async fn run(cli: &Cli, materializer: &Materializer<ReqwestClient>) -> Result<()> {
    let cancel = materializer.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling outstanding downloads");
            cancel.cancel();
        }
    });

    let metrics = materializer
        .materialize(&cli.dest)
        .await
        .with_context(|| format!("failed to materialize into {}", cli.dest.display()))?;
    report(&metrics)
}

fn report(metrics: &RunMetrics) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &metrics.to_map()).context("failed to write metrics")?;
    writeln!(stdout).context("failed to write metrics")?;
    Ok(())
}
