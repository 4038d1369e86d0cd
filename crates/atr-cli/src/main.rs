//! # atr CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Attestation Registry Stack CLI.
///
/// Runs an end-to-end demo deployment and derives schema identifiers.
#[derive(Parser, Debug)]
#[command(name = "atr", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the end-to-end demo scenario and print the event log.
    Demo(atr_cli::demo::DemoArgs),
    /// Derive the schema identifier for a context string.
    SchemaId(atr_cli::schema_id::SchemaIdArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo(args) => atr_cli::demo::run(&args),
        Commands::SchemaId(args) => atr_cli::schema_id::run(&args),
    }
}
