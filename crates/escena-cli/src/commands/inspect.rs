//! Summarizes a snapshot or workspace file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use escena_session::{GraphSnapshot, WorkspaceState};

#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot or workspace JSON file
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    // Workspace files carry a slot list; plain snapshots don't. Try the
    // richer shape first.
    if let Ok(state) = serde_json::from_slice::<WorkspaceState>(&bytes) {
        print_workspaces(&state);
        return Ok(());
    }
    let snapshot: GraphSnapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is neither a workspace nor a snapshot file", args.file.display()))?;
    print_snapshot(&snapshot, 0);
    Ok(())
}

fn print_workspaces(state: &WorkspaceState) {
    println!(
        "Workspace state: {} slots, active = {}",
        state.slots.len(),
        state.active
    );
    for (i, slot) in state.slots.iter().enumerate() {
        let marker = if i == state.active { "*" } else { " " };
        let status = match (slot.enabled, slot.occupied) {
            (false, _) => "disabled",
            (true, false) => "empty",
            (true, true) => "occupied",
        };
        println!("  {marker} [{i:>2}] {:<16} {status}", slot.name);
        if let Some(data) = &slot.data {
            print_snapshot(data, 8);
        }
    }
}

fn print_snapshot(snapshot: &GraphSnapshot, indent: usize) {
    let pad = " ".repeat(indent);
    println!(
        "{pad}{} node(s), {} connection(s)",
        snapshot.nodes.len(),
        snapshot.connections.len()
    );
    for node in &snapshot.nodes {
        let bypass = if node.bypassed { " (bypassed)" } else { "" };
        println!(
            "{pad}  {:<10} at ({:.0}, {:.0}){bypass}",
            node.type_tag, node.x, node.y
        );
    }
}
