//! Command-line interface for folio
//!
//! - init: create the data directory layout
//! - serve: run the HTTP API
//! - list: print posts in display order
//! - resequence: rewrite stored ranks to a dense 0..n-1
//! - sweep: remove blobs no post references
//!
//! `serve` holds a lock file in the data directory; stop it before running
//! `resequence` or `sweep`.

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod lock;

pub use args::{Cli, Command};
pub use commands::{
    init, list, open_service, resequence, run, run_command, serve, sweep, LocalPostService,
};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
pub use lock::{ensure_not_serving, ServeLock};
