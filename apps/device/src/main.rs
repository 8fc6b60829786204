//! # FrigoGest Device Entry Point
//!
//! ```bash
//! frigogest link AB12CD      # share data with other devices using AB12CD
//! frigogest run              # sync every 15 s until Ctrl+C
//! frigogest dashboard
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use clap::Parser;
use frigo_device::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Help, version and malformed arguments exit here with clap's own codes
    let cli = Cli::parse();

    frigo_device::init_tracing();

    match frigo_device::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
