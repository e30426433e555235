//! Ledgerline CLI binary.
//!
//! Serves the company report API and runs one-off reports and extractions.

mod server;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use ledgerline::Aggregator;
use ledgerline::data::config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MIN_INTERVAL, DEFAULT_RETRY_BACKOFF,
    DEFAULT_TIMEOUT,
};
use ledgerline::data::{
    DocumentFetcher, FactExtractor, FactFilter, RegistryClient, RegistryConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(about = "Ledgerline: company registry data and inline-XBRL financial facts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Options {
    /// Companies House API key
    #[arg(long, env = "COMPANIES_HOUSE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Registry API base URL
    #[arg(long, env = "LEDGERLINE_REGISTRY_URL", default_value = DEFAULT_BASE_URL, global = true)]
    registry_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "LEDGERLINE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs(), global = true)]
    timeout_secs: u64,

    /// Minimum spacing between registry requests in milliseconds
    #[arg(long, env = "LEDGERLINE_MIN_INTERVAL_MS", default_value_t = DEFAULT_MIN_INTERVAL.as_millis() as u64, global = true)]
    min_interval_ms: u64,

    /// Retries after the first attempt for transient registry failures
    #[arg(long, env = "LEDGERLINE_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    max_retries: u32,

    /// Base retry delay in milliseconds, doubled on every retry
    #[arg(long, default_value_t = DEFAULT_RETRY_BACKOFF.as_millis() as u64, global = true)]
    retry_backoff_ms: u64,

    /// Directory for downloaded documents (defaults to the OS temp dir)
    #[arg(long, env = "LEDGERLINE_SCRATCH_DIR", global = true)]
    scratch_dir: Option<PathBuf>,

    /// Keep text facts and non-numeric values
    #[arg(long, global = true)]
    include_non_numeric: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "LEDGERLINE_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,
    },

    /// Print the report for one company as JSON
    Report {
        /// Company name to search for
        company_name: String,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Extract inline-XBRL facts from a local XHTML file
    Extract {
        /// Path to the XHTML document
        path: PathBuf,
    },
}

impl Options {
    fn registry_config(&self) -> Result<RegistryConfig> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("missing API key: pass --api-key or set COMPANIES_HOUSE_API_KEY");
        };
        let config = RegistryConfig::new(api_key)
            .with_base_url(self.registry_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_min_interval(Duration::from_millis(self.min_interval_ms))
            .with_retries(self.max_retries, Duration::from_millis(self.retry_backoff_ms));
        config.validate()?;
        Ok(config)
    }

    const fn extractor(&self) -> FactExtractor {
        if self.include_non_numeric {
            FactExtractor::with_filter(FactFilter::All)
        } else {
            FactExtractor::with_filter(FactFilter::NumericOnly)
        }
    }

    fn fetcher(&self) -> DocumentFetcher {
        self.scratch_dir
            .as_ref()
            .map_or_else(DocumentFetcher::new, |dir| {
                DocumentFetcher::with_scratch_dir(dir.as_path())
            })
    }

    fn aggregator(&self) -> Result<Aggregator<RegistryClient>> {
        let client = RegistryClient::new(self.registry_config()?)
            .context("failed to create registry client")?;
        Ok(Aggregator::new(client)
            .with_fetcher(self.fetcher())
            .with_extractor(self.extractor()))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve { bind } => {
            let aggregator = cli.options.aggregator()?;
            server::serve(bind, server::router(Arc::new(aggregator))).await?;
        }
        Commands::Report {
            company_name,
            compact,
        } => {
            let aggregator = cli.options.aggregator()?;
            let report = aggregator.report(&company_name).await?;
            let output = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", output);
        }
        Commands::Extract { path } => {
            let facts = cli
                .options
                .extractor()
                .extract_path(&path)
                .with_context(|| format!("failed to extract facts from {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&facts)?);
        }
    }

    Ok(())
}

/// Logs go to stderr so report output on stdout stays machine readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
