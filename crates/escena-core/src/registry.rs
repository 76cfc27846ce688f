//! Node factory registry.
//!
//! Effect units are created by type tag through a [`NodeRegistry`]: a table
//! mapping each tag to a descriptor (metadata for UIs and the CLI) and a
//! factory function returning a boxed [`AudioNode`]. Enumerating the
//! available types is a key listing, not a hand-maintained list.
//!
//! The registry ships empty; the `escena-registry` crate populates it with
//! the built-in effect units.

use crate::node::{AudioNode, is_reserved_tag};

/// Category of a node type, for UI grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Dynamics processing (gates, compressors).
    Dynamics,
    /// Time-based effects (delays, doublers).
    TimeBased,
    /// Filters and tone shaping.
    Filter,
    /// Gain stages and utility processors.
    Utility,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Dynamics => "Dynamics",
            NodeCategory::TimeBased => "Time-Based",
            NodeCategory::Filter => "Filter",
            NodeCategory::Utility => "Utility",
        }
    }
}

/// Describes one registered node type.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Stable type tag (lowercase, no spaces) - the factory and persistence
    /// key.
    pub tag: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
}

/// Factory function type for creating nodes.
type NodeFactory = fn() -> Box<dyn AudioNode>;

struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: NodeFactory,
}

/// Table of available node types, keyed by type tag.
#[derive(Default)]
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a node type.
    ///
    /// Returns `false` (and registers nothing) if the tag is reserved for a
    /// permanent role or already present.
    pub fn register(&mut self, descriptor: NodeDescriptor, factory: NodeFactory) -> bool {
        if is_reserved_tag(descriptor.tag) || self.contains(descriptor.tag) {
            return false;
        }
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
        true
    }

    /// Creates a node instance by type tag, or `None` for an unknown tag.
    pub fn create(&self, tag: &str) -> Option<Box<dyn AudioNode>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.tag == tag)
            .map(|e| (e.factory)())
    }

    /// Returns the descriptor for a tag.
    pub fn descriptor(&self, tag: &str) -> Option<&NodeDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.tag == tag)
            .map(|e| &e.descriptor)
    }

    /// Returns descriptors for every registered type, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Returns descriptors for one category.
    pub fn in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Whether a tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|e| e.descriptor.tag == tag)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioBuffer;
    use crate::midi::MidiEvent;
    use crate::node::{BusLayout, HARDWARE_INPUT_TAG};

    struct Passthrough;

    impl AudioNode for Passthrough {
        fn prepare_to_play(&mut self, _sample_rate: f32, _block_size: usize) {}
        fn process_block(&mut self, _audio: &mut AudioBuffer, _midi: &[MidiEvent]) {}
        fn bus_layout(&self) -> BusLayout {
            BusLayout::stereo()
        }
        fn effect_type(&self) -> &'static str {
            "passthrough"
        }
    }

    fn descriptor(tag: &'static str) -> NodeDescriptor {
        NodeDescriptor {
            tag,
            name: "Passthrough",
            description: "Does nothing",
            category: NodeCategory::Utility,
        }
    }

    #[test]
    fn register_and_create() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register(descriptor("passthrough"), || Box::new(Passthrough)));
        assert!(registry.contains("passthrough"));
        assert_eq!(registry.len(), 1);

        let node = registry.create("passthrough").unwrap();
        assert_eq!(node.effect_type(), "passthrough");
    }

    #[test]
    fn unknown_tag_creates_nothing() {
        let registry = NodeRegistry::new();
        assert!(registry.create("missing").is_none());
        assert!(registry.descriptor("missing").is_none());
    }

    #[test]
    fn reserved_tags_cannot_be_registered() {
        let mut registry = NodeRegistry::new();
        let mut desc = descriptor("passthrough");
        desc.tag = HARDWARE_INPUT_TAG;
        assert!(!registry.register(desc, || Box::new(Passthrough)));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register(descriptor("passthrough"), || Box::new(Passthrough)));
        assert!(!registry.register(descriptor("passthrough"), || Box::new(Passthrough)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn category_filtering() {
        let mut registry = NodeRegistry::new();
        registry.register(descriptor("a"), || Box::new(Passthrough));
        assert_eq!(registry.in_category(NodeCategory::Utility).len(), 1);
        assert!(registry.in_category(NodeCategory::Dynamics).is_empty());
    }
}
