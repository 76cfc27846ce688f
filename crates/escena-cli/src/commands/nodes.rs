//! Lists the available node types.

use clap::Args;
use escena_registry::builtin_registry;

#[derive(Args)]
pub struct NodesArgs {
    /// Only list tags, one per line (for scripting)
    #[arg(long)]
    tags: bool,
}

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = builtin_registry();

    if args.tags {
        for descriptor in registry.descriptors() {
            println!("{}", descriptor.tag);
        }
        return Ok(());
    }

    println!("Available node types:\n");
    for descriptor in registry.descriptors() {
        println!(
            "  {:<10} {:<12} [{}]",
            descriptor.tag,
            descriptor.name,
            descriptor.category.name()
        );
        println!("             {}", descriptor.description);
    }
    Ok(())
}
