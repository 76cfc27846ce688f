//! Writes a starter scene: hardware input -> delay -> hardware output.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use escena_core::{AudioGraphEngine, Connection, NodeRole, media};
use escena_registry::builtin_registry;
use escena_session::GraphSerializer;

#[derive(Args)]
pub struct DemoArgs {
    /// Where to write the scene file
    #[arg(value_name = "FILE", default_value = "demo-scene.json")]
    output: PathBuf,
}

pub fn run(args: DemoArgs) -> anyhow::Result<()> {
    let mut engine = AudioGraphEngine::new(builtin_registry());
    engine.prepare(48_000.0, 512, 2, 2, media::silence());

    let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
    let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
    let delay = engine
        .add_effect("delay", 380.0, 300.0)
        .expect("built-in delay must exist");

    engine.add_connection(Connection::new(input, 0, delay, 0))?;
    engine.add_connection(Connection::new(delay, 0, output, 0))?;
    engine.add_connection(Connection::new(input, 1, delay, 1))?;
    engine.add_connection(Connection::new(delay, 1, output, 1))?;

    if !GraphSerializer::save_to_file(&engine, &args.output) {
        bail!("could not write {}", args.output.display());
    }
    println!("Wrote starter scene to {}", args.output.display());
    Ok(())
}
