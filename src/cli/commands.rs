//! CLI command implementations
//!
//! Every command loads the configuration first. Commands other than `init`
//! refuse to run against a data directory that was never initialized, and
//! `resequence` and `sweep` refuse to run while `serve` holds the data
//! directory.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::blob_store::{BlobStore, DownloadTokens, LocalBackend};
use crate::http_server::HttpServer;
use crate::observability::{Event, Logger};
use crate::record_store::JsonFileRecordStore;
use crate::service::PostService;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;
use super::lock::{ensure_not_serving, ServeLock};

/// The service as wired by the CLI
pub type LocalPostService = PostService<JsonFileRecordStore, LocalBackend>;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::List { config } => list(&config),
        Command::Resequence { config } => resequence(&config),
        Command::Sweep { config, dry_run } => sweep(&config, dry_run),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    Logger::info(Event::BootStart, &[]);
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_severity());

    let path = config_path.display().to_string();
    Logger::info(
        Event::ConfigLoaded,
        &[("config", &path), ("data_dir", &config.data_dir)],
    );
    Ok(config)
}

fn is_initialized(config: &Config) -> bool {
    config.collections_dir().is_dir() && config.blobs_dir().is_dir()
}

/// Open the record and blob stores below the data directory.
pub fn open_service(config: &Config) -> CliResult<LocalPostService> {
    if !is_initialized(config) {
        return Err(CliError::NotInitialized);
    }

    let records = JsonFileRecordStore::open(config.collections_dir())
        .map_err(|e| CliError::boot_failed(format!("Failed to open record store: {}", e)))?;
    let blobs = BlobStore::new(
        LocalBackend::new(config.blobs_dir()),
        DownloadTokens::new(config.url_secret.as_bytes()),
        &config.public_base_url,
        config.max_upload_bytes,
    );
    Ok(PostService::new(records, blobs))
}

/// Create the data directory layout. Writes no records.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::AlreadyInitialized);
    }

    for dir in [config.collections_dir(), config.blobs_dir()] {
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    Logger::info(Event::DataDirInitialized, &[("data_dir", &config.data_dir)]);
    write_response(&json!({"initialized": true, "data_dir": config.data_dir}))
}

/// Serve the HTTP API until ctrl-c.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;
    let _lock = ServeLock::acquire(config.data_path())?;

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::new(http_config, service);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print posts in display order.
pub fn list(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let listing = service.list_posts()?;
    write_response(&json!({
        "total": listing.posts.len(),
        "consistent": listing.consistent,
        "posts": listing.posts,
    }))
}

/// Rewrite stored ranks to match display order.
pub fn resequence(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    ensure_not_serving(&config)?;
    let service = open_service(&config)?;

    let rewritten = service.resequence()?;
    write_response(&json!({ "rewritten": rewritten }))
}

/// Delete (or with `dry_run`, report) unreferenced blobs.
pub fn sweep(config_path: &Path, dry_run: bool) -> CliResult<()> {
    let config = load_config(config_path)?;
    ensure_not_serving(&config)?;
    let service = open_service(&config)?;

    let report = service.sweep_orphaned_blobs(dry_run)?;
    write_response(&report)
}
