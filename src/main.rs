//! folio CLI entry point
//!
//! Argument parsing, configuration and dispatch all live in the cli module.

use folio::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
