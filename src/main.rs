#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vitalis::config::Config;
use vitalis::providers::is_known_provider;

/// `vitalis` - AI virtual health assistant in your terminal.
#[derive(Parser, Debug)]
#[command(name = "vitalis")]
#[command(version)]
#[command(about = "Describe your symptoms, get a preliminary assessment. Not medical advice.", long_about = None)]
struct Cli {
    /// Config file to read instead of ~/.vitalis/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Provider to use (gemini, openai-compatible)
    #[arg(long)]
    provider: Option<String>,

    /// Model name passed to the provider
    #[arg(long)]
    model: Option<String>,

    /// Print replies at once instead of revealing them character by character
    #[arg(long)]
    no_reveal: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.provider.name.clone_from(provider);
        }
        if let Some(model) = &self.model {
            config.provider.model = Some(model.clone());
        }
        if self.no_reveal {
            config.reveal.enabled = false;
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load()?,
    };
    cli.apply(&mut config);

    if !is_known_provider(&config.provider.name) {
        bail!(
            "Unknown provider '{}'. Use \"gemini\" or \"openai-compatible\".",
            config.provider.name
        );
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the chat. Respects
    // RUST_LOG; defaults to WARN (DEBUG with --verbose).
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = load_config(&cli)?;
    vitalis::chat::run(config).await
}
