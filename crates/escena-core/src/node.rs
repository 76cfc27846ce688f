//! The node capability contract.
//!
//! Every pluggable effect unit implements [`AudioNode`]; the engine consumes
//! nothing else. The contract is deliberately narrow: lifecycle
//! (prepare/release), one real-time processing entry, a bus-layout query, a
//! stable type tag used as the persistence key, and an opaque state blob that
//! only the node itself interprets.

use crate::buffer::AudioBuffer;
use crate::midi::MidiEvent;

/// Reserved type tag for the hardware input role.
pub const HARDWARE_INPUT_TAG: &str = "io.hardware_input";
/// Reserved type tag for the hardware output role.
pub const HARDWARE_OUTPUT_TAG: &str = "io.hardware_output";
/// Reserved type tag for the playback (media player) role.
pub const PLAYBACK_TAG: &str = "io.playback";

/// Returns true for the three reserved permanent-role tags.
///
/// Reserved tags cannot be registered in a [`NodeRegistry`](crate::NodeRegistry)
/// and are rejected by [`AudioGraphEngine::add_effect`](crate::AudioGraphEngine::add_effect);
/// the permanent nodes are built by `prepare`, never by the factory path.
pub fn is_reserved_tag(tag: &str) -> bool {
    matches!(tag, HARDWARE_INPUT_TAG | HARDWARE_OUTPUT_TAG | PLAYBACK_TAG)
}

/// Input/output channel counts of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLayout {
    /// Number of input channels.
    pub inputs: usize,
    /// Number of output channels.
    pub outputs: usize,
}

impl BusLayout {
    /// Creates a layout with the given channel counts.
    pub const fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }

    /// A stereo in, stereo out layout - the shape of every shipped effect.
    pub const fn stereo() -> Self {
        Self::new(2, 2)
    }

    /// A pure source: no inputs, `outputs` outputs.
    pub const fn source(outputs: usize) -> Self {
        Self::new(0, outputs)
    }

    /// A pure sink: `inputs` inputs, no outputs.
    pub const fn sink(inputs: usize) -> Self {
        Self::new(inputs, 0)
    }

    /// The larger of the two channel counts; the engine sizes each node's
    /// working buffer to this.
    pub const fn max_channels(&self) -> usize {
        if self.inputs > self.outputs {
            self.inputs
        } else {
            self.outputs
        }
    }
}

/// The capability contract implemented by every effect unit in the graph.
///
/// The engine calls `prepare_to_play`/`release_resources` from the control
/// thread and `process_block` from the audio thread, once per hardware
/// period. `process_block` receives a buffer with
/// [`bus_layout().max_channels()`](BusLayout::max_channels) channels: the
/// first `inputs` channels hold the summed input on entry, and the node
/// leaves its output in the first `outputs` channels. Implementations must
/// not allocate or block inside `process_block`.
pub trait AudioNode: Send {
    /// Called before processing starts or whenever the audio configuration
    /// changes. May allocate.
    fn prepare_to_play(&mut self, sample_rate: f32, block_size: usize);

    /// Called when the node leaves the processing graph or the engine is
    /// torn down.
    fn release_resources(&mut self) {}

    /// Processes one block in place. Real-time safe.
    fn process_block(&mut self, audio: &mut AudioBuffer, midi: &[MidiEvent]);

    /// The node's channel configuration.
    fn bus_layout(&self) -> BusLayout;

    /// Whether the node can run with the given layout. The default accepts
    /// only the node's own fixed layout.
    fn is_buses_layout_supported(&self, layout: &BusLayout) -> bool {
        *layout == self.bus_layout()
    }

    /// Stable type tag, used as the factory and persistence key.
    fn effect_type(&self) -> &'static str;

    /// Cosmetic category string for UI grouping. Default empty.
    fn node_category(&self) -> &'static str {
        ""
    }

    /// Exports the node's parameter state into `out` as an opaque blob.
    ///
    /// The blob's format is owned by the node; callers store and return it
    /// verbatim. The default exports nothing (stateless node).
    fn get_state(&self, out: &mut Vec<u8>) {
        out.clear();
    }

    /// Restores parameter state previously produced by
    /// [`get_state`](Self::get_state). Unrecognized data must be ignored,
    /// never panic; the node keeps its current state on a bad blob.
    fn set_state(&mut self, _data: &[u8]) {}
}
