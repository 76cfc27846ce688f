//! Permanent node roles and their processors.
//!
//! Hardware input, hardware output, and playback exist exactly once whenever
//! the engine is prepared. The engine stages hardware samples into the input
//! node's buffer and drains the output node's buffer itself; those two
//! processors are therefore inert pass-throughs whose only job is to carry a
//! bus layout sized to the current device. The playback node pulls stereo
//! audio from the shared [`MediaSource`] handle.

use crate::buffer::AudioBuffer;
use crate::media::SharedMediaSource;
use crate::midi::MidiEvent;
use crate::node::{
    AudioNode, BusLayout, HARDWARE_INPUT_TAG, HARDWARE_OUTPUT_TAG, PLAYBACK_TAG,
};

use super::connection::NodeId;

/// The three permanent roles present in every prepared graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Audio arriving from the hardware device.
    HardwareInput,
    /// Audio leaving to the hardware device.
    HardwareOutput,
    /// The media player source.
    Playback,
}

impl NodeRole {
    /// The reserved type tag for this role.
    pub const fn tag(self) -> &'static str {
        match self {
            NodeRole::HardwareInput => HARDWARE_INPUT_TAG,
            NodeRole::HardwareOutput => HARDWARE_OUTPUT_TAG,
            NodeRole::Playback => PLAYBACK_TAG,
        }
    }

    /// All roles, in a stable order.
    pub const ALL: [NodeRole; 3] = [
        NodeRole::HardwareInput,
        NodeRole::HardwareOutput,
        NodeRole::Playback,
    ];
}

/// The engine-owned handle to the three permanent node ids.
///
/// Swapped as one unit during a device rebuild: the audio thread observes
/// either the complete old set, `None` mid-rebuild, or the complete new set.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PermanentNodes {
    pub input: NodeId,
    pub output: NodeId,
    pub playback: NodeId,
}

impl PermanentNodes {
    /// The role of `id`, if it is one of the permanent nodes.
    pub fn role_of(&self, id: NodeId) -> Option<NodeRole> {
        if id == self.input {
            Some(NodeRole::HardwareInput)
        } else if id == self.output {
            Some(NodeRole::HardwareOutput)
        } else if id == self.playback {
            Some(NodeRole::Playback)
        } else {
            None
        }
    }

    /// Whether `id` is one of the permanent nodes.
    pub fn contains(&self, id: NodeId) -> bool {
        self.role_of(id).is_some()
    }

    /// The id currently filling `role`.
    pub fn id_for(&self, role: NodeRole) -> NodeId {
        match role {
            NodeRole::HardwareInput => self.input,
            NodeRole::HardwareOutput => self.output,
            NodeRole::Playback => self.playback,
        }
    }
}

/// Source node carrying audio from the hardware device into the graph.
///
/// The engine copies the period's input samples into this node's buffer
/// before the render walk; processing is a no-op.
pub(crate) struct HardwareInputNode {
    channels: usize,
}

impl HardwareInputNode {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }
}

impl AudioNode for HardwareInputNode {
    fn prepare_to_play(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_block(&mut self, _audio: &mut AudioBuffer, _midi: &[MidiEvent]) {}

    fn bus_layout(&self) -> BusLayout {
        BusLayout::source(self.channels)
    }

    fn effect_type(&self) -> &'static str {
        HARDWARE_INPUT_TAG
    }

    fn node_category(&self) -> &'static str {
        "I/O"
    }
}

/// Sink node carrying graph audio out to the hardware device.
///
/// The engine drains this node's accumulated buffer into the period's output
/// samples after the render walk; processing is a no-op.
pub(crate) struct HardwareOutputNode {
    channels: usize,
}

impl HardwareOutputNode {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }
}

impl AudioNode for HardwareOutputNode {
    fn prepare_to_play(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_block(&mut self, _audio: &mut AudioBuffer, _midi: &[MidiEvent]) {}

    fn bus_layout(&self) -> BusLayout {
        BusLayout::sink(self.channels)
    }

    fn effect_type(&self) -> &'static str {
        HARDWARE_OUTPUT_TAG
    }

    fn node_category(&self) -> &'static str {
        "I/O"
    }
}

/// Source node pulling stereo audio from the shared media player.
pub(crate) struct PlaybackNode {
    source: SharedMediaSource,
}

impl PlaybackNode {
    pub fn new(source: SharedMediaSource) -> Self {
        Self { source }
    }
}

impl AudioNode for PlaybackNode {
    fn prepare_to_play(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
        if audio.num_channels() < 2 {
            audio.clear();
            return;
        }
        // try_lock, never block: a contended period plays silence.
        let Ok(mut source) = self.source.try_lock() else {
            audio.clear();
            return;
        };
        let (left, right) = audio.channel_pair_mut(0, 1);
        source.read_block(left, right);
    }

    fn bus_layout(&self) -> BusLayout {
        BusLayout::source(2)
    }

    fn effect_type(&self) -> &'static str {
        PLAYBACK_TAG
    }

    fn node_category(&self) -> &'static str {
        "I/O"
    }
}
