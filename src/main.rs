// Veridict - main.rs
// Bootstrap runner for the adaptive trust scoring engine

use clap::Parser;
use std::process::exit;
use veridict::cli::{execute, Cli};
use veridict::governance::EXIT_STRUCTURAL_FAILURE;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("❌ {err:#}");
            exit(EXIT_STRUCTURAL_FAILURE);
        }
    }
}
