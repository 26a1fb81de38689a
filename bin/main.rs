//! Roster CLI Entry Point
//!
//! This binary provides the command-line interface for Roster.

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = roster_interface::run_cli().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
