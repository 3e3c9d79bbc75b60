#![forbid(unsafe_code)]

//! badge: GitHub Badge CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("badge: {e}");
        std::process::exit(1);
    }
}
