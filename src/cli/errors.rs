//! CLI errors
//!
//! Printed as `FOLIO_CLI_<KIND>: <message>` on stderr; the process then
//! exits with status 1.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::service::PostError;

/// Stable machine-readable kind of a `CliError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    ConfigError,
    IoError,
    AlreadyInitialized,
    NotInitialized,
    /// Another process is serving the data directory
    DataDirBusy,
    BootFailed,
    CommandFailed,
}

impl CliErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "FOLIO_CLI_CONFIG_ERROR",
            Self::IoError => "FOLIO_CLI_IO_ERROR",
            Self::AlreadyInitialized => "FOLIO_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "FOLIO_CLI_NOT_INITIALIZED",
            Self::DataDirBusy => "FOLIO_CLI_DATA_DIR_BUSY",
            Self::BootFailed => "FOLIO_CLI_BOOT_FAILED",
            Self::CommandFailed => "FOLIO_CLI_COMMAND_FAILED",
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("FOLIO_CLI_CONFIG_ERROR: {0}")]
    Config(String),

    #[error("FOLIO_CLI_IO_ERROR: {0}")]
    Io(String),

    #[error("FOLIO_CLI_ALREADY_INITIALIZED: Data directory already initialized")]
    AlreadyInitialized,

    #[error("FOLIO_CLI_NOT_INITIALIZED: Data directory not initialized. Run 'folio init' first.")]
    NotInitialized,

    /// `lock` names the lock file so a stale one can be removed by hand
    #[error(
        "FOLIO_CLI_DATA_DIR_BUSY: {holder} holds {}; stop it first (remove the file if no server is running)",
        .lock.display()
    )]
    DataDirBusy { lock: PathBuf, holder: String },

    #[error("FOLIO_CLI_BOOT_FAILED: {0}")]
    BootFailed(String),

    #[error("FOLIO_CLI_COMMAND_FAILED: {} ({})", .0, .0.code())]
    Command(#[from] PostError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        CliError::Io(msg.into())
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        CliError::BootFailed(msg.into())
    }

    pub fn code(&self) -> CliErrorCode {
        match self {
            CliError::Config(_) => CliErrorCode::ConfigError,
            CliError::Io(_) => CliErrorCode::IoError,
            CliError::AlreadyInitialized => CliErrorCode::AlreadyInitialized,
            CliError::NotInitialized => CliErrorCode::NotInitialized,
            CliError::DataDirBusy { .. } => CliErrorCode::DataDirBusy,
            CliError::BootFailed(_) => CliErrorCode::BootFailed,
            CliError::Command(_) => CliErrorCode::CommandFailed,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// Display text without the code prefix
    pub fn message(&self) -> String {
        let rendered = self.to_string();
        match rendered.split_once(": ") {
            Some((_, message)) => message.to_string(),
            None => rendered,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {}", e))
    }
}

pub type CliResult<T> = Result<T, CliError>;
