//! markergen: generate data frame marker declarations from a schema.
//!
//! Usage:
//!     markergen generate schema.json --name Person --package org.example -o Person.kt

mod config;
mod generate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "markergen", version, about = "Marker type and accessor declarations for typed data frames")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize markers for a serialized schema and print a Kotlin source file
    Generate(generate::GenerateArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MARKERGEN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => generate::run(&args),
    };
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
