//! Built-in node registry for Escena.
//!
//! [`builtin_registry`] returns a
//! [`NodeRegistry`](escena_core::NodeRegistry) populated with every shipped
//! effect unit, keyed by its stable type tag. The engine looks effects up
//! here when the UI adds units, and the serializer looks tags up when it
//! validates snapshots - enumeration is always a key listing, never a
//! hand-maintained list.
//!
//! # Example
//!
//! ```rust
//! use escena_registry::builtin_registry;
//!
//! let registry = builtin_registry();
//! assert!(registry.contains("delay"));
//!
//! for descriptor in registry.descriptors() {
//!     println!("{}: {}", descriptor.tag, descriptor.description);
//! }
//! ```

use escena_core::{NodeCategory, NodeDescriptor, NodeRegistry};
use escena_nodes::{NoiseGate, Preamp, StereoDelay, ToneFilter};

/// Builds the registry of all shipped node types.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(
        NodeDescriptor {
            tag: "preamp",
            name: "Preamp",
            description: "Clean gain stage with smoothed level changes",
            category: NodeCategory::Utility,
        },
        || Box::new(Preamp::new()),
    );

    registry.register(
        NodeDescriptor {
            tag: "delay",
            name: "Delay",
            description: "Stereo feedback delay for slap and doubling",
            category: NodeCategory::TimeBased,
        },
        || Box::new(StereoDelay::new()),
    );

    registry.register(
        NodeDescriptor {
            tag: "tone",
            name: "Tone",
            description: "One-pole low-pass tone control",
            category: NodeCategory::Filter,
        },
        || Box::new(ToneFilter::new()),
    );

    registry.register(
        NodeDescriptor {
            tag: "gate",
            name: "Noise Gate",
            description: "Envelope-follower gate for stage bleed",
            category: NodeCategory::Dynamics,
        },
        || Box::new(NoiseGate::new()),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use escena_core::is_reserved_tag;

    #[test]
    fn every_builtin_is_creatable() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 4);
        for descriptor in registry.descriptors() {
            let node = registry
                .create(descriptor.tag)
                .unwrap_or_else(|| panic!("factory missing for {}", descriptor.tag));
            assert_eq!(node.effect_type(), descriptor.tag);
            assert_eq!(node.node_category(), descriptor.category.name());
        }
    }

    #[test]
    fn tags_are_stable() {
        let registry = builtin_registry();
        for tag in ["preamp", "delay", "tone", "gate"] {
            assert!(registry.contains(tag), "missing tag {tag}");
            assert!(!is_reserved_tag(tag));
        }
    }

    #[test]
    fn state_blobs_round_trip_through_the_contract() {
        let registry = builtin_registry();
        for descriptor in registry.descriptors() {
            let node = registry.create(descriptor.tag).unwrap();
            let mut blob = Vec::new();
            node.get_state(&mut blob);
            assert!(!blob.is_empty(), "{} exports no state", descriptor.tag);

            let mut restored = registry.create(descriptor.tag).unwrap();
            restored.set_state(&blob);
            let mut blob2 = Vec::new();
            restored.get_state(&mut blob2);
            assert_eq!(blob, blob2, "{} state must round-trip", descriptor.tag);
        }
    }

    #[test]
    fn categories_cover_the_palette() {
        let registry = builtin_registry();
        assert_eq!(registry.in_category(NodeCategory::Utility).len(), 1);
        assert_eq!(registry.in_category(NodeCategory::TimeBased).len(), 1);
        assert_eq!(registry.in_category(NodeCategory::Filter).len(), 1);
        assert_eq!(registry.in_category(NodeCategory::Dynamics).len(), 1);
    }
}
