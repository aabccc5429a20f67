//! Serve lock
//!
//! `serve` holds `<data_dir>/serve.lock` for as long as it runs. Commands
//! that rewrite records or delete blobs refuse to start while the file
//! exists; `list` only reads and is allowed.
//!
//! The lock is advisory. A server killed without unwinding leaves the file
//! behind and it has to be removed by hand.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::config::Config;
use super::errors::{CliError, CliResult};

const LOCK_FILE: &str = "serve.lock";

/// Held by a running server; removes the lock file on drop
#[derive(Debug)]
pub struct ServeLock {
    path: PathBuf,
}

impl ServeLock {
    pub fn acquire(data_dir: &Path) -> CliResult<Self> {
        let path = data_dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                write!(file, "{}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(busy(path)),
            Err(e) => Err(CliError::io_error(format!(
                "Failed to create {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ServeLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Fail when a server currently holds the data directory.
pub fn ensure_not_serving(config: &Config) -> CliResult<()> {
    let path = config.data_path().join(LOCK_FILE);
    if path.exists() {
        return Err(busy(path));
    }
    Ok(())
}

fn busy(path: PathBuf) -> CliError {
    let holder = match fs::read_to_string(&path) {
        Ok(pid) if !pid.trim().is_empty() => format!("folio serve (pid {})", pid.trim()),
        _ => "folio serve".to_string(),
    };
    CliError::DataDirBusy { lock: path, holder }
}
