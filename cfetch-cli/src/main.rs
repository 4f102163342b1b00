use std::path::PathBuf;
use std::time::Duration;

use cacheable_fetch::cache::{EntryStore, FileStore};
use cacheable_fetch::{
    CacheableFetch, FetchConfig, RequestDescriptor, ResponseDescriptor, StoreConfig,
};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod error;
mod utils;

use cli::CliArgs;
use error::AppError;
use utils::parse_headers;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Request failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging, RUST_LOG takes precedence over --verbose
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let mut config_builder = FetchConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_caching_enabled(!args.no_cache);
    if let Some(path) = &args.storage_path {
        config_builder = config_builder.with_storage_path(path);
    }
    let config = config_builder.build();
    debug!(?config, "Resolved configuration");

    if args.clear_cache {
        let path = clear_cache(&config.store).await?;
        info!(path = %path.display(), "Cleared response cache");
    }

    let client = CacheableFetch::new(config)?;

    let Some(url) = &args.url else {
        return Ok(());
    };

    let mut request =
        RequestDescriptor::parse(&args.method, url.as_str())?.with_headers(parse_headers(&args.headers)?);
    if let Some(data) = &args.data {
        request = request.with_body(data.as_str());
    }

    let response = client.fetch(&request).await?;
    info!(
        status = %response.status(),
        cache = ?response.cache_status(),
        "{} {}",
        request.method(),
        request.url()
    );

    write_response(response, args.include).await
}

/// Clear the configured store directory, even when caching is switched off
/// for this run.
async fn clear_cache(store: &StoreConfig) -> Result<PathBuf, AppError> {
    let path = store.resolved_path();
    FileStore::new(&path, true).clear().await?;
    Ok(path)
}

async fn write_response(response: ResponseDescriptor, include_head: bool) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();

    if include_head {
        let mut head = format!("HTTP/1.1 {}\r\n", response.status());
        for (name, value) in response.headers() {
            head.push_str(&format!("{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes())));
        }
        head.push_str("\r\n");
        stdout.write_all(head.as_bytes()).await?;
    }

    let mut reader = response.into_body().into_reader();
    tokio::io::copy(&mut reader, &mut stdout).await?;
    stdout.flush().await?;
    Ok(())
}
