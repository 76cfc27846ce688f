//! Escena CLI - offline host for the live performance effects engine.

mod commands;
mod media;
mod wav;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "escena")]
#[command(author, version, about = "Escena live effects host CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available node types and their categories
    Nodes(commands::nodes::NodesArgs),

    /// Summarize a snapshot or workspace file
    Inspect(commands::inspect::InspectArgs),

    /// Render a WAV file through a saved graph
    Render(commands::render::RenderArgs),

    /// Write a starter scene file (input -> delay -> output)
    Demo(commands::demo::DemoArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Demo(args) => commands::demo::run(args),
    }
}
