use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use stratus_aws_core::config::ProviderConfig;
use stratus_aws_provider::{Provider, serve::serve};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory that holds `aws/config.ron`.
    #[arg(short = 'p', long, env = "STRATUS_PREFIX", default_value = ".")]
    prefix: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries responses, so logs go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up tracing")?;

    let args = Args::parse();

    let config = ProviderConfig::try_load(&args.prefix)?;
    let account_id = config.verify_sts().await.context("Failed to verify AWS credentials")?;
    info!(account_id = %account_id, "Verified AWS credentials");

    let provider = Provider::new(config, account_id);
    serve(&provider, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Input closed, exiting");
    Ok(())
}
