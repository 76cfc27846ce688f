//! The engine: node table, connection list, mutation API, and the per-block
//! render entry point.
//!
//! Mutations happen on the control thread and may briefly allocate
//! (recomputing the render order, sizing buffers). The audio thread only
//! calls [`AudioGraphEngine::process_block`], which walks the precomputed
//! topological order with zero allocation, no locks, and no logging.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::media::SharedMediaSource;
use crate::midi::MidiEvent;
use crate::node::{AudioNode, BusLayout, is_reserved_tag};
use crate::param::SmoothedParam;
use crate::registry::NodeRegistry;

use super::connection::{Connection, Endpoint, NodeId};
use super::io_nodes::{
    HardwareInputNode, HardwareOutputNode, NodeRole, PermanentNodes, PlaybackNode,
};
use super::meter::{MAX_METER_CHANNELS, PeakMeter};

/// Blocks of forced-silence hardware output after a device restart.
///
/// Stale samples trapped in delay lines and reverb tails from the previous
/// device epoch ("zombie buffers") are flushed behind a muted output while
/// input keeps feeding the nodes, so their internal state keeps evolving.
pub const ZOMBIE_FLUSH_BLOCKS: u32 = 4;

/// Smoothing time for the bypass gain ramps, in milliseconds.
const BYPASS_RAMP_MS: f32 = 10.0;

/// Default canvas positions for the permanent nodes (grid-aligned).
const DEFAULT_INPUT_POS: (f32, f32) = (90.0, 90.0);
const DEFAULT_OUTPUT_POS: (f32, f32) = (90.0, 540.0);
const DEFAULT_PLAYBACK_POS: (f32, f32) = (675.0, 90.0);

/// Lifecycle state of the engine.
///
/// Mutators are defined in every state except `Uninitialized`; audio is
/// produced only while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No node table exists. Only `prepare` does anything.
    Uninitialized,
    /// Prepared and processing audio.
    Running,
    /// Device offline; topology preserved, `process_block` renders silence.
    Suspended,
}

/// Errors returned by structural graph mutations.
///
/// These never cross the audio thread: every validation failure is reported
/// to the control-thread caller and the graph is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An endpoint references a node absent from the table.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// A channel index is outside the endpoint node's bus layout.
    #[error("channel {channel} out of range for node {node}")]
    ChannelOutOfRange {
        /// The offending node.
        node: NodeId,
        /// The requested channel.
        channel: usize,
    },
    /// An identical connection already exists.
    #[error("connection already exists")]
    DuplicateConnection,
    /// The connection would make the graph cyclic.
    #[error("connection would create a cycle")]
    CycleDetected,
    /// The engine has not been prepared.
    #[error("engine is not prepared")]
    NotPrepared,
}

/// One entry in the node table.
struct NodeSlot {
    node: Box<dyn AudioNode>,
    position: (f32, f32),
    bypassed: bool,
    /// 1.0 = wet (active), 0.0 = dry (bypassed).
    bypass_fade: SmoothedParam,
    layout: BusLayout,
    /// Working buffer: `layout.max_channels()` channels of one block.
    buffer: AudioBuffer,
    /// Dry copy of the block input, used during the bypass crossfade.
    dry: AudioBuffer,
}

/// How one endpoint of a hardware wire is remembered across a device rebuild.
enum WireEnd {
    /// A permanent node, remembered by role (identity changes on rebuild).
    Role(NodeRole, usize),
    /// A user node, remembered by id (identity survives the rebuild).
    Node(NodeId, usize),
}

/// A connection touching a permanent node, saved before the old permanent
/// nodes are destroyed and replayed against the new ones.
struct SavedIoWire {
    source: WireEnd,
    dest: WireEnd,
}

/// The mutable real-time audio processing graph.
///
/// See the [module docs](super) for the overall model. All methods take
/// `&mut self`; the host owns the engine and decides which thread calls
/// what. The intended split: every structural mutation on the control
/// thread, [`process_block`](Self::process_block) alone on the audio
/// thread.
pub struct AudioGraphEngine {
    registry: NodeRegistry,
    nodes: Vec<Option<NodeSlot>>,
    connections: Vec<Connection>,
    /// Node-table indices in topological order, recomputed on mutation.
    render_order: Vec<usize>,
    permanent: Option<PermanentNodes>,
    state: EngineState,
    sample_rate: f32,
    block_size: usize,
    hw_inputs: usize,
    hw_outputs: usize,
    media: Option<SharedMediaSource>,
    next_node_id: u32,
    /// Hardware input bypass ramp, applied while staging input.
    input_gain: SmoothedParam,
    /// Hardware output bypass ramp, applied after draining output.
    output_gain: SmoothedParam,
    /// Forced-silence countdown, decremented only inside `process_block`.
    flush_countdown: u32,
    meter: Arc<PeakMeter>,
    /// Per-type editor window sizes, persisted with snapshots.
    window_sizes: BTreeMap<String, (u32, u32)>,
}

impl AudioGraphEngine {
    /// Creates an unprepared engine over the given registry.
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            connections: Vec::new(),
            render_order: Vec::new(),
            permanent: None,
            state: EngineState::Uninitialized,
            sample_rate: 0.0,
            block_size: 0,
            hw_inputs: 0,
            hw_outputs: 0,
            media: None,
            next_node_id: 0,
            input_gain: SmoothedParam::new(1.0),
            output_gain: SmoothedParam::new(1.0),
            flush_countdown: 0,
            meter: Arc::new(PeakMeter::new()),
            window_sizes: BTreeMap::new(),
        }
    }

    // --- Lifecycle ---

    /// Prepares (or re-prepares) the engine for the given audio
    /// configuration. Idempotent; never fails.
    ///
    /// The first call builds the three permanent nodes and an empty user
    /// topology. Later calls rebuild only the permanent nodes: wires
    /// touching them are saved by role and channel, replayed against the new
    /// nodes, and silently dropped when their channel no longer exists.
    /// User nodes and user-to-user wires are never touched. Negative channel
    /// counts clamp to zero.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        block_size: usize,
        num_hw_inputs: i32,
        num_hw_outputs: i32,
        media: SharedMediaSource,
    ) {
        self.sample_rate = if sample_rate > 0.0 { sample_rate } else { 44_100.0 };
        self.block_size = block_size.max(1);
        self.hw_inputs = num_hw_inputs.max(0) as usize;
        self.hw_outputs = num_hw_outputs.max(0) as usize;
        self.media = Some(Arc::clone(&media));
        self.state = EngineState::Running;

        #[cfg(feature = "tracing")]
        tracing::info!(
            sample_rate = self.sample_rate,
            block_size = self.block_size,
            inputs = self.hw_inputs,
            outputs = self.hw_outputs,
            "graph prepare"
        );

        self.rebuild_io_nodes(media);

        for slot in self.nodes.iter_mut().flatten() {
            slot.buffer.resize(slot.layout.max_channels(), self.block_size);
            slot.dry.resize(slot.layout.max_channels(), self.block_size);
            slot.bypass_fade.set_sample_rate(self.sample_rate);
            slot.node.prepare_to_play(self.sample_rate, self.block_size);
        }

        self.input_gain = SmoothedParam::with_config(
            self.input_gain.get(),
            self.sample_rate,
            BYPASS_RAMP_MS,
        );
        self.output_gain = SmoothedParam::with_config(
            self.output_gain.get(),
            self.sample_rate,
            BYPASS_RAMP_MS,
        );

        self.recompute_render_order();
        self.flush_countdown = ZOMBIE_FLUSH_BLOCKS;
    }

    /// Tears down every node and returns to `Uninitialized`.
    pub fn release_resources(&mut self) {
        if matches!(self.state, EngineState::Uninitialized) {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::info!("graph release");

        for slot in self.nodes.iter_mut().flatten() {
            slot.node.release_resources();
        }
        self.nodes.clear();
        self.connections.clear();
        self.render_order.clear();
        self.permanent = None;
        self.media = None;
        self.flush_countdown = 0;
        self.state = EngineState::Uninitialized;
    }

    /// Marks the device offline. Topology is preserved;
    /// [`process_block`](Self::process_block) renders silence until the next
    /// [`prepare`](Self::prepare).
    pub fn suspend(&mut self) {
        if matches!(self.state, EngineState::Running) {
            #[cfg(feature = "tracing")]
            tracing::info!("graph suspend");
            self.state = EngineState::Suspended;
        }
    }

    /// Arms the forced-silence countdown after a device restart.
    ///
    /// For the next [`ZOMBIE_FLUSH_BLOCKS`] periods the hardware output is
    /// muted while input keeps feeding the nodes. The countdown is
    /// decremented only by the audio thread.
    pub fn flush_buffers(&mut self) {
        if !matches!(self.state, EngineState::Uninitialized) {
            self.flush_countdown = ZOMBIE_FLUSH_BLOCKS;
        }
    }

    // --- The real-time entry point ---

    /// Renders one block. The sole audio-thread entry point.
    ///
    /// On entry the first `hardware_inputs()` channels of `io` hold the
    /// period's input; on exit the first `hardware_outputs()` channels hold
    /// the output. Renders silence (and touches nothing else) unless the
    /// engine is `Running` with a complete permanent-node set.
    pub fn process_block(&mut self, io: &mut AudioBuffer, midi: &[MidiEvent]) {
        let Self {
            nodes,
            connections,
            render_order,
            permanent,
            state,
            input_gain,
            output_gain,
            flush_countdown,
            meter,
            hw_inputs,
            hw_outputs,
            block_size,
            ..
        } = self;

        if !matches!(*state, EngineState::Running) {
            io.clear();
            return;
        }
        // A device rebuild may be mid-flight; degrade to silence, never
        // dereference a missing permanent node.
        let Some(perm) = *permanent else {
            io.clear();
            return;
        };

        let samples = io.num_samples().min(*block_size);
        let hw_in = (*hw_inputs).min(io.num_channels());
        let hw_out = (*hw_outputs).min(io.num_channels());

        for ch in 0..hw_in.min(MAX_METER_CHANNELS) {
            meter.store_input(ch, io.peak(ch, samples));
        }

        // Stage hardware input into the input node's buffer, applying the
        // input bypass ramp.
        let input_idx = perm.input.0 as usize;
        let in_bypassed = nodes
            .get(input_idx)
            .and_then(|s| s.as_ref())
            .is_some_and(|s| s.bypassed);
        input_gain.set_target(if in_bypassed { 0.0 } else { 1.0 });
        if let Some(Some(slot)) = nodes.get_mut(input_idx) {
            slot.buffer.clear();
            let chans = hw_in.min(slot.buffer.num_channels());
            for ch in 0..chans {
                slot.buffer.copy_channel_from(io, ch, ch, samples);
            }
            if !input_gain.is_settled() {
                for i in 0..samples {
                    let g = input_gain.advance();
                    for ch in 0..chans {
                        slot.buffer.channel_mut(ch)[i] *= g;
                    }
                }
            } else if input_gain.get() == 0.0 {
                slot.buffer.clear();
            }
        }

        // Walk the precomputed topological order.
        let output_idx = perm.output.0 as usize;
        for &idx in render_order.iter() {
            if idx == input_idx {
                continue; // staged above
            }
            if nodes.get(idx).and_then(|s| s.as_ref()).is_none() {
                continue;
            }

            // Sum every incoming connection into this node's buffer.
            if let Some(Some(slot)) = nodes.get_mut(idx) {
                slot.buffer.clear();
            }
            for c in connections.iter() {
                if c.dest.node.0 as usize != idx {
                    continue;
                }
                let src_idx = c.source.node.0 as usize;
                if src_idx == idx {
                    continue;
                }
                if let Some((src, dst)) = slot_pair(nodes, src_idx, idx) {
                    dst.buffer
                        .add_channel_from(&src.buffer, c.source.channel, c.dest.channel, samples);
                }
            }

            if idx == output_idx {
                continue; // drained below, after the walk
            }

            let Some(Some(slot)) = nodes.get_mut(idx) else {
                continue;
            };
            let bypass_active = slot.bypassed || !slot.bypass_fade.is_settled();
            if bypass_active {
                slot.dry.clear();
                let in_chans = slot.layout.inputs.min(slot.dry.num_channels());
                for ch in 0..in_chans {
                    slot.dry.copy_channel_from(&slot.buffer, ch, ch, samples);
                }
            }

            slot.node.process_block(&mut slot.buffer, midi);

            if bypass_active {
                let out_chans = slot.layout.outputs.min(slot.buffer.num_channels());
                for i in 0..samples {
                    let wet = slot.bypass_fade.advance();
                    for ch in 0..out_chans {
                        let dry = slot.dry.channel(ch)[i];
                        let sample = slot.buffer.channel(ch)[i];
                        slot.buffer.channel_mut(ch)[i] = dry + (sample - dry) * wet;
                    }
                }
            }
        }

        // Drain the output node's accumulated buffer into the hardware
        // buffer, applying the output bypass ramp.
        io.clear();
        let mut out_bypassed = false;
        if let Some(Some(out_slot)) = nodes.get(output_idx).map(|s| s.as_ref()) {
            let chans = hw_out.min(out_slot.buffer.num_channels());
            for ch in 0..chans {
                io.copy_channel_from(&out_slot.buffer, ch, ch, samples);
            }
            out_bypassed = out_slot.bypassed;
        }
        output_gain.set_target(if out_bypassed { 0.0 } else { 1.0 });
        if !output_gain.is_settled() {
            for i in 0..samples {
                let g = output_gain.advance();
                for ch in 0..hw_out {
                    io.channel_mut(ch)[i] *= g;
                }
            }
        } else if output_gain.get() == 0.0 {
            io.clear();
        }

        // Zombie flush: mute the hardware output while node state keeps
        // evolving from real input.
        if *flush_countdown > 0 {
            io.clear();
            *flush_countdown -= 1;
        }

        for ch in 0..hw_out.min(MAX_METER_CHANNELS) {
            meter.store_output(ch, io.peak(ch, samples));
        }
    }

    // --- Structural mutation ---

    /// Creates a node of the given type and inserts it with default state
    /// and no connections. Returns `None` for an unknown or reserved tag, or
    /// while the engine is `Uninitialized`.
    pub fn add_effect(&mut self, type_tag: &str, x: f32, y: f32) -> Option<NodeId> {
        if matches!(self.state, EngineState::Uninitialized) {
            return None;
        }
        if is_reserved_tag(type_tag) {
            #[cfg(feature = "tracing")]
            tracing::warn!(tag = type_tag, "add_effect rejected reserved tag");
            return None;
        }
        let Some(node) = self.registry.create(type_tag) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(tag = type_tag, "add_effect unknown tag");
            return None;
        };
        let id = self.insert_slot(node, (x, y));
        #[cfg(feature = "tracing")]
        tracing::debug!(tag = type_tag, node = %id, "graph add effect");
        Some(id)
    }

    /// Removes a user node and every connection touching it.
    ///
    /// Returns `false` without mutating anything for permanent nodes and
    /// absent ids (idempotent).
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if matches!(self.state, EngineState::Uninitialized) {
            return false;
        }
        if let Some(perm) = &self.permanent
            && perm.contains(id)
        {
            return false;
        }
        if self.slot(id).is_none() {
            return false;
        }
        self.remove_slot(id);
        #[cfg(feature = "tracing")]
        tracing::debug!(node = %id, "graph remove node");
        true
    }

    /// Removes every connection touching `id`, keeping the node.
    pub fn disconnect_node(&mut self, id: NodeId) {
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        if self.connections.len() != before {
            self.recompute_render_order();
            #[cfg(feature = "tracing")]
            tracing::debug!(node = %id, dropped = before - self.connections.len(), "graph disconnect node");
        }
    }

    /// Adds a connection after validating both endpoints, channel ranges,
    /// duplicates, and acyclicity.
    pub fn add_connection(&mut self, c: Connection) -> Result<(), GraphError> {
        if matches!(self.state, EngineState::Uninitialized) {
            return Err(GraphError::NotPrepared);
        }
        let src = self
            .slot(c.source.node)
            .ok_or(GraphError::NodeNotFound(c.source.node))?;
        if c.source.channel >= src.layout.outputs {
            return Err(GraphError::ChannelOutOfRange {
                node: c.source.node,
                channel: c.source.channel,
            });
        }
        let dst = self
            .slot(c.dest.node)
            .ok_or(GraphError::NodeNotFound(c.dest.node))?;
        if c.dest.channel >= dst.layout.inputs {
            return Err(GraphError::ChannelOutOfRange {
                node: c.dest.node,
                channel: c.dest.channel,
            });
        }
        if self.connections.contains(&c) {
            return Err(GraphError::DuplicateConnection);
        }
        // Rejecting the edge up front keeps the render order a plain
        // topological walk; the audio thread never needs a cycle guard.
        if self.can_reach(c.dest.node, c.source.node) {
            return Err(GraphError::CycleDetected);
        }

        self.connections.push(c);
        self.recompute_render_order();
        #[cfg(feature = "tracing")]
        tracing::debug!(connection = %c, "graph connect");
        Ok(())
    }

    /// Removes an exact connection. Returns whether anything was removed.
    pub fn remove_connection(&mut self, c: &Connection) -> bool {
        let before = self.connections.len();
        self.connections.retain(|existing| existing != c);
        let removed = self.connections.len() != before;
        if removed {
            self.recompute_render_order();
            #[cfg(feature = "tracing")]
            tracing::debug!(connection = %c, "graph disconnect");
        }
        removed
    }

    /// Removes every non-permanent node (and, with them, every connection
    /// touching one). Hardware and playback routing survives.
    pub fn clear_user_nodes(&mut self) {
        for id in self.user_nodes() {
            self.remove_node(id);
        }
    }

    // --- Queries ---

    /// True once `prepare` has run and until `release_resources`.
    pub fn is_prepared(&self) -> bool {
        !matches!(self.state, EngineState::Uninitialized)
    }

    /// The current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Sample rate from the last `prepare`.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Block size from the last `prepare`.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hardware input channel count from the last `prepare`.
    pub fn hardware_inputs(&self) -> usize {
        self.hw_inputs
    }

    /// Hardware output channel count from the last `prepare`.
    pub fn hardware_outputs(&self) -> usize {
        self.hw_outputs
    }

    /// The registry this engine creates effects from.
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Shared handle to the input/output peak meters.
    pub fn meter(&self) -> Arc<PeakMeter> {
        Arc::clone(&self.meter)
    }

    /// The id currently filling a permanent role, if prepared.
    pub fn permanent_node(&self, role: NodeRole) -> Option<NodeId> {
        self.permanent.as_ref().map(|p| p.id_for(role))
    }

    /// The permanent role of `id`, if it has one.
    pub fn node_role(&self, id: NodeId) -> Option<NodeRole> {
        self.permanent.as_ref().and_then(|p| p.role_of(id))
    }

    /// Every live node id, permanent nodes included, in table order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// Every non-permanent node id, in table order.
    pub fn user_nodes(&self) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|&id| self.node_role(id).is_none())
            .collect()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of live nodes, permanent included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|s| s.is_some()).count()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The live connection list.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The type tag of a node.
    pub fn effect_type(&self, id: NodeId) -> Option<&'static str> {
        self.slot(id).map(|s| s.node.effect_type())
    }

    /// The cosmetic category of a node.
    pub fn node_category(&self, id: NodeId) -> Option<&'static str> {
        self.slot(id).map(|s| s.node.node_category())
    }

    /// The canvas position of a node.
    pub fn position(&self, id: NodeId) -> Option<(f32, f32)> {
        self.slot(id).map(|s| s.position)
    }

    /// Moves a node on the canvas. Cosmetic only.
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.position = (x, y);
                true
            }
            None => false,
        }
    }

    /// Whether a node is bypassed.
    pub fn is_bypassed(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| s.bypassed)
    }

    /// Sets a node's bypass flag. The audible change is a short crossfade,
    /// not a hard mute; the node keeps processing so its state stays warm.
    pub fn set_bypassed(&mut self, id: NodeId, bypassed: bool) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.bypassed = bypassed;
                slot.bypass_fade
                    .set_target(if bypassed { 0.0 } else { 1.0 });
                true
            }
            None => false,
        }
    }

    /// The bus layout of a node.
    pub fn bus_layout(&self, id: NodeId) -> Option<BusLayout> {
        self.slot(id).map(|s| s.layout)
    }

    /// Exports a node's opaque parameter blob.
    pub fn node_state(&self, id: NodeId) -> Option<Vec<u8>> {
        self.slot(id).map(|s| {
            let mut out = Vec::new();
            s.node.get_state(&mut out);
            out
        })
    }

    /// Pushes an opaque parameter blob back into a node.
    pub fn set_node_state(&mut self, id: NodeId, data: &[u8]) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.node.set_state(data);
                true
            }
            None => false,
        }
    }

    /// Per-type editor window sizes, persisted alongside snapshots.
    pub fn window_sizes(&self) -> &BTreeMap<String, (u32, u32)> {
        &self.window_sizes
    }

    /// Records the editor window size for a node type.
    pub fn set_window_size(&mut self, type_tag: &str, width: u32, height: u32) {
        self.window_sizes
            .insert(type_tag.to_owned(), (width, height));
    }

    /// Replaces the whole window-size map (snapshot restore).
    pub fn replace_window_sizes(&mut self, sizes: BTreeMap<String, (u32, u32)>) {
        self.window_sizes = sizes;
    }

    // --- Internals ---

    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.nodes.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    fn insert_slot(&mut self, node: Box<dyn AudioNode>, position: (f32, f32)) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let layout = node.bus_layout();
        let chans = layout.max_channels();
        let mut slot = NodeSlot {
            node,
            position,
            bypassed: false,
            bypass_fade: SmoothedParam::with_config(1.0, self.sample_rate, BYPASS_RAMP_MS),
            layout,
            buffer: AudioBuffer::new(chans, self.block_size),
            dry: AudioBuffer::new(chans, self.block_size),
        };
        if !matches!(self.state, EngineState::Uninitialized) {
            slot.node.prepare_to_play(self.sample_rate, self.block_size);
        }

        let idx = id.0 as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
        }
        self.nodes[idx] = Some(slot);
        self.recompute_render_order();
        id
    }

    /// Disconnects and drops a slot, permanent or not. Callers guard roles.
    fn remove_slot(&mut self, id: NodeId) {
        self.connections.retain(|c| !c.touches(id));
        if let Some(mut slot) = self.nodes.get_mut(id.0 as usize).and_then(Option::take) {
            slot.node.release_resources();
        }
        self.recompute_render_order();
    }

    /// Tears down only the permanent nodes and rebuilds them for the current
    /// channel counts, preserving their wires where channels still exist.
    fn rebuild_io_nodes(&mut self, media: SharedMediaSource) {
        let saved = self.save_io_wires();

        let mut cosmetics = [
            (DEFAULT_INPUT_POS, false),
            (DEFAULT_OUTPUT_POS, false),
            (DEFAULT_PLAYBACK_POS, false),
        ];
        if let Some(perm) = self.permanent.take() {
            for (i, role) in NodeRole::ALL.iter().enumerate() {
                let id = perm.id_for(*role);
                if let Some(slot) = self.slot(id) {
                    cosmetics[i] = (slot.position, slot.bypassed);
                }
                self.remove_slot(id);
            }
        }

        let input = self.insert_slot(
            Box::new(HardwareInputNode::new(self.hw_inputs)),
            cosmetics[0].0,
        );
        let output = self.insert_slot(
            Box::new(HardwareOutputNode::new(self.hw_outputs)),
            cosmetics[1].0,
        );
        let playback = self.insert_slot(Box::new(PlaybackNode::new(media)), cosmetics[2].0);

        for (id, (_, bypassed)) in [input, output, playback].into_iter().zip(cosmetics) {
            if let Some(slot) = self.slot_mut(id) {
                slot.bypassed = bypassed;
                slot.bypass_fade.set_immediate(if bypassed { 0.0 } else { 1.0 });
            }
        }

        self.permanent = Some(PermanentNodes {
            input,
            output,
            playback,
        });

        self.restore_io_wires(saved);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            inputs = self.hw_inputs,
            outputs = self.hw_outputs,
            "rebuilt permanent nodes"
        );
    }

    fn save_io_wires(&self) -> Vec<SavedIoWire> {
        let Some(perm) = &self.permanent else {
            return Vec::new();
        };
        let as_end = |e: Endpoint| match perm.role_of(e.node) {
            Some(role) => WireEnd::Role(role, e.channel),
            None => WireEnd::Node(e.node, e.channel),
        };
        self.connections
            .iter()
            .filter(|c| perm.contains(c.source.node) || perm.contains(c.dest.node))
            .map(|c| SavedIoWire {
                source: as_end(c.source),
                dest: as_end(c.dest),
            })
            .collect()
    }

    fn restore_io_wires(&mut self, saved: Vec<SavedIoWire>) {
        let Some(perm) = self.permanent else {
            return;
        };
        let as_endpoint = |end: &WireEnd| match *end {
            WireEnd::Role(role, channel) => Endpoint::new(perm.id_for(role), channel),
            WireEnd::Node(id, channel) => Endpoint::new(id, channel),
        };
        for wire in &saved {
            let c = Connection {
                source: as_endpoint(&wire.source),
                dest: as_endpoint(&wire.dest),
            };
            // Channels that no longer exist fail validation here; dropping
            // such a wire is the documented non-fatal truncation.
            if let Err(_err) = self.add_connection(c) {
                #[cfg(feature = "tracing")]
                tracing::debug!(connection = %c, error = %_err, "dropped hardware wire on rebuild");
            }
        }
    }

    /// DFS reachability over the connection list: can `from` reach `to`?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            for c in &self.connections {
                if c.source.node == current {
                    stack.push(c.dest.node);
                }
            }
        }
        false
    }

    /// Kahn's topological sort over the live nodes.
    ///
    /// Cycles cannot exist here (rejected at `add_connection`), so the walk
    /// always covers every live node.
    fn recompute_render_order(&mut self) {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        let mut active = 0usize;
        for (i, slot) in self.nodes.iter().enumerate() {
            if slot.is_some() {
                active += 1;
                in_degree[i] = self
                    .connections
                    .iter()
                    .filter(|c| c.dest.node.0 as usize == i)
                    .count() as u32;
            }
        }

        let mut queue: Vec<usize> = (0..n)
            .filter(|&i| self.nodes[i].is_some() && in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(active);

        while let Some(idx) = queue.pop() {
            order.push(idx);
            for c in &self.connections {
                if c.source.node.0 as usize == idx {
                    let d = c.dest.node.0 as usize;
                    in_degree[d] -= 1;
                    if in_degree[d] == 0 {
                        queue.push(d);
                    }
                }
            }
        }

        debug_assert_eq!(order.len(), active, "render order must cover every node");
        self.render_order = order;
    }
}

/// Splits the node table into one source (shared) and one destination
/// (mutable) slot. Returns `None` if either slot is empty.
fn slot_pair(
    nodes: &mut [Option<NodeSlot>],
    src: usize,
    dst: usize,
) -> Option<(&NodeSlot, &mut NodeSlot)> {
    if src == dst || src >= nodes.len() || dst >= nodes.len() {
        return None;
    }
    if src < dst {
        let (lo, hi) = nodes.split_at_mut(dst);
        Some((lo[src].as_ref()?, hi[0].as_mut()?))
    } else {
        let (lo, hi) = nodes.split_at_mut(src);
        Some((hi[0].as_ref()?, lo[dst].as_mut()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media;
    use crate::registry::{NodeCategory, NodeDescriptor, NodeRegistry};

    /// Stereo gain test effect with a 4-byte state blob.
    struct GainNode {
        factor: f32,
    }

    impl AudioNode for GainNode {
        fn prepare_to_play(&mut self, _sample_rate: f32, _block_size: usize) {}

        fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
            for ch in 0..audio.num_channels() {
                for s in audio.channel_mut(ch) {
                    *s *= self.factor;
                }
            }
        }

        fn bus_layout(&self) -> BusLayout {
            BusLayout::stereo()
        }

        fn effect_type(&self) -> &'static str {
            "gain"
        }

        fn get_state(&self, out: &mut Vec<u8>) {
            out.clear();
            out.extend_from_slice(&self.factor.to_le_bytes());
        }

        fn set_state(&mut self, data: &[u8]) {
            if let Ok(bytes) = <[u8; 4]>::try_from(data) {
                self.factor = f32::from_le_bytes(bytes);
            }
        }
    }

    fn test_registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeDescriptor {
                tag: "gain",
                name: "Gain",
                description: "Multiplies by a factor",
                category: NodeCategory::Utility,
            },
            || Box::new(GainNode { factor: 2.0 }),
        );
        registry
    }

    const BLOCK: usize = 8;

    fn prepared_engine() -> AudioGraphEngine {
        let mut engine = AudioGraphEngine::new(test_registry());
        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        engine
    }

    fn io_buffer(value: f32) -> AudioBuffer {
        let mut io = AudioBuffer::new(2, BLOCK);
        io.channel_mut(0).fill(value);
        io.channel_mut(1).fill(value);
        io
    }

    /// Runs the zombie-flush countdown dry.
    fn drain_flush(engine: &mut AudioGraphEngine) {
        let mut io = AudioBuffer::new(2, BLOCK);
        for _ in 0..ZOMBIE_FLUSH_BLOCKS {
            engine.process_block(&mut io, &[]);
        }
    }

    fn assert_no_dangling(engine: &AudioGraphEngine) {
        for c in engine.connections() {
            assert!(engine.contains(c.source.node), "dangling source in {c}");
            assert!(engine.contains(c.dest.node), "dangling dest in {c}");
        }
    }

    #[test]
    fn prepare_builds_exactly_one_of_each_role() {
        let mut engine = AudioGraphEngine::new(test_registry());
        assert!(!engine.is_prepared());
        for role in NodeRole::ALL {
            assert!(engine.permanent_node(role).is_none());
        }

        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        assert!(engine.is_prepared());
        assert_eq!(engine.node_count(), 3);
        for role in NodeRole::ALL {
            let id = engine.permanent_node(role).unwrap();
            assert_eq!(engine.node_role(id), Some(role));
            assert_eq!(engine.effect_type(id), Some(role.tag()));
        }

        engine.release_resources();
        assert!(!engine.is_prepared());
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn prepare_clamps_negative_channel_counts() {
        let mut engine = AudioGraphEngine::new(test_registry());
        engine.prepare(48_000.0, BLOCK, -4, -1, media::silence());
        assert_eq!(engine.hardware_inputs(), 0);
        assert_eq!(engine.hardware_outputs(), 0);
        assert!(engine.is_prepared());
    }

    #[test]
    fn add_effect_unknown_and_reserved_tags_fail() {
        let mut engine = prepared_engine();
        assert!(engine.add_effect("no_such_effect", 0.0, 0.0).is_none());
        assert!(
            engine
                .add_effect(crate::node::HARDWARE_INPUT_TAG, 0.0, 0.0)
                .is_none()
        );
        assert_eq!(engine.node_count(), 3);
    }

    #[test]
    fn add_effect_requires_prepare() {
        let mut engine = AudioGraphEngine::new(test_registry());
        assert!(engine.add_effect("gain", 0.0, 0.0).is_none());
    }

    #[test]
    fn remove_node_guards_permanent_and_is_idempotent() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        assert!(!engine.remove_node(input));
        assert_eq!(engine.node_count(), 3);

        let gain = engine.add_effect("gain", 10.0, 20.0).unwrap();
        assert!(engine.remove_node(gain));
        assert!(!engine.remove_node(gain));
        assert!(!engine.contains(gain));
    }

    #[test]
    fn node_ids_are_never_reused() {
        let mut engine = prepared_engine();
        let a = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine.remove_node(a);
        let b = engine.add_effect("gain", 0.0, 0.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn add_connection_validates_everything() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();

        // Missing node.
        let ghost = NodeId(999);
        assert!(matches!(
            engine.add_connection(Connection::new(ghost, 0, gain, 0)),
            Err(GraphError::NodeNotFound(_))
        ));

        // Channel out of range: input node has 2 outputs.
        assert!(matches!(
            engine.add_connection(Connection::new(input, 2, gain, 0)),
            Err(GraphError::ChannelOutOfRange { .. })
        ));
        // Destination channel out of range: output node has 2 inputs.
        assert!(matches!(
            engine.add_connection(Connection::new(gain, 0, output, 5)),
            Err(GraphError::ChannelOutOfRange { .. })
        ));
        // Output node has no outputs; it can never be a source.
        assert!(matches!(
            engine.add_connection(Connection::new(output, 0, gain, 0)),
            Err(GraphError::ChannelOutOfRange { .. })
        ));

        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        assert!(matches!(
            engine.add_connection(Connection::new(input, 0, gain, 0)),
            Err(GraphError::DuplicateConnection)
        ));
        assert_eq!(engine.connection_count(), 1);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut engine = prepared_engine();
        let a = engine.add_effect("gain", 0.0, 0.0).unwrap();
        let b = engine.add_effect("gain", 0.0, 0.0).unwrap();

        engine.add_connection(Connection::new(a, 0, b, 0)).unwrap();
        assert!(matches!(
            engine.add_connection(Connection::new(b, 0, a, 0)),
            Err(GraphError::CycleDetected)
        ));
        // Self loops are cycles too.
        assert!(matches!(
            engine.add_connection(Connection::new(a, 1, a, 1)),
            Err(GraphError::CycleDetected)
        ));
    }

    #[test]
    fn removing_a_node_removes_its_connections() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();

        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 0, output, 0))
            .unwrap();
        assert_eq!(engine.connection_count(), 2);

        engine.remove_node(gain);
        assert_eq!(engine.connection_count(), 0);
        assert_no_dangling(&engine);
    }

    #[test]
    fn disconnect_node_keeps_the_node() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();

        engine.disconnect_node(gain);
        assert_eq!(engine.connection_count(), 0);
        assert!(engine.contains(gain));
    }

    #[test]
    fn remove_connection_is_exact_match() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();

        assert!(!engine.remove_connection(&Connection::new(input, 1, gain, 1)));
        assert!(engine.remove_connection(&Connection::new(input, 0, gain, 0)));
        assert!(!engine.remove_connection(&Connection::new(input, 0, gain, 0)));
    }

    #[test]
    fn process_block_is_silence_unless_running() {
        let mut engine = AudioGraphEngine::new(test_registry());
        let mut io = io_buffer(0.5);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().all(|&s| s == 0.0));

        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        engine.suspend();
        let mut io = io_buffer(0.5);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().all(|&s| s == 0.0));
        assert!(engine.is_prepared(), "suspend preserves the topology");
    }

    #[test]
    fn zombie_flush_mutes_the_first_blocks() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();

        for block in 0..ZOMBIE_FLUSH_BLOCKS {
            let mut io = io_buffer(0.5);
            engine.process_block(&mut io, &[]);
            assert!(
                io.channel(0).iter().all(|&s| s == 0.0),
                "block {block} must be muted"
            );
        }
        let mut io = io_buffer(0.5);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().any(|&s| s != 0.0));
    }

    #[test]
    fn passthrough_wiring_is_identity() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(input, 1, output, 1))
            .unwrap();
        drain_flush(&mut engine);

        let mut io = io_buffer(0.25);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert!(io.channel(1).iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn effect_chain_applies_gain() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();

        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 0, output, 0))
            .unwrap();
        drain_flush(&mut engine);

        let mut io = io_buffer(0.25);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
        // Channel 1 is unwired and therefore silent.
        assert!(io.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn fan_in_sums_sources() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(input, 1, output, 0))
            .unwrap();
        drain_flush(&mut engine);

        let mut io = io_buffer(0.25);
        engine.process_block(&mut io, &[]);
        assert!(io.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn bypassed_effect_crossfades_to_dry() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 0, output, 0))
            .unwrap();
        drain_flush(&mut engine);

        engine.set_bypassed(gain, true);
        assert!(engine.is_bypassed(gain));

        // Run well past the 10ms ramp (a second of audio).
        let mut io = io_buffer(0.25);
        for _ in 0..(48_000 / BLOCK) {
            io = io_buffer(0.25);
            engine.process_block(&mut io, &[]);
        }
        assert!(
            io.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-3),
            "bypassed chain must settle at the dry signal"
        );
    }

    #[test]
    fn hardware_output_bypass_ramps_to_silence() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();
        drain_flush(&mut engine);

        engine.set_bypassed(output, true);
        let mut io = io_buffer(0.25);
        for _ in 0..(48_000 / BLOCK) {
            io = io_buffer(0.25);
            engine.process_block(&mut io, &[]);
        }
        assert!(io.channel(0).iter().all(|&s| s.abs() < 1e-3));

        // And back: un-bypassing ramps the signal back in.
        engine.set_bypassed(output, false);
        for _ in 0..(48_000 / BLOCK) {
            io = io_buffer(0.25);
            engine.process_block(&mut io, &[]);
        }
        assert!(io.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn reprepare_preserves_user_topology_and_hardware_wires() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 5.0, 6.0).unwrap();
        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 0, output, 0))
            .unwrap();

        engine.prepare(44_100.0, BLOCK, 2, 2, media::silence());

        // New permanent identities, same roles.
        let new_input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let new_output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        assert_ne!(new_input, input);
        assert_ne!(new_output, output);

        // The user node survived with its wires re-pointed.
        assert!(engine.contains(gain));
        assert_eq!(engine.connection_count(), 2);
        assert!(
            engine
                .connections()
                .contains(&Connection::new(new_input, 0, gain, 0))
        );
        assert!(
            engine
                .connections()
                .contains(&Connection::new(gain, 0, new_output, 0))
        );
        assert_no_dangling(&engine);
    }

    #[test]
    fn shrinking_hardware_outputs_drops_only_lost_channels() {
        let mut engine = AudioGraphEngine::new(test_registry());
        engine.prepare(48_000.0, BLOCK, 2, 8, media::silence());
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();

        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 0, output, 1))
            .unwrap();
        engine
            .add_connection(Connection::new(gain, 1, output, 7))
            .unwrap();
        let a = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine.add_connection(Connection::new(gain, 0, a, 0)).unwrap();

        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        let new_output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();

        // channel 1 < 2 survives, channel 7 >= 2 is dropped, the
        // user-to-user wire is untouched.
        assert!(
            engine
                .connections()
                .contains(&Connection::new(gain, 0, new_output, 1))
        );
        assert!(
            !engine
                .connections()
                .iter()
                .any(|c| c.dest.node == new_output && c.dest.channel == 7)
        );
        assert!(engine.connections().contains(&Connection::new(gain, 0, a, 0)));
        assert_no_dangling(&engine);
    }

    #[test]
    fn playback_to_output_wire_survives_rebuild() {
        let mut engine = prepared_engine();
        let playback = engine.permanent_node(NodeRole::Playback).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(playback, 0, output, 0))
            .unwrap();

        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        let new_playback = engine.permanent_node(NodeRole::Playback).unwrap();
        let new_output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        assert!(
            engine
                .connections()
                .contains(&Connection::new(new_playback, 0, new_output, 0))
        );
    }

    #[test]
    fn clear_user_nodes_keeps_hardware_routing() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();
        engine
            .add_connection(Connection::new(input, 0, gain, 0))
            .unwrap();

        engine.clear_user_nodes();
        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.connection_count(), 1);
        assert!(
            engine
                .connections()
                .contains(&Connection::new(input, 0, output, 0))
        );
    }

    #[test]
    fn node_state_round_trips_through_the_engine() {
        let mut engine = prepared_engine();
        let gain = engine.add_effect("gain", 0.0, 0.0).unwrap();

        let state = engine.node_state(gain).unwrap();
        assert_eq!(state, 2.0f32.to_le_bytes());

        assert!(engine.set_node_state(gain, &3.5f32.to_le_bytes()));
        assert_eq!(engine.node_state(gain).unwrap(), 3.5f32.to_le_bytes());
    }

    #[test]
    fn metering_tracks_io_peaks() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
        engine
            .add_connection(Connection::new(input, 0, output, 0))
            .unwrap();
        drain_flush(&mut engine);

        let meter = engine.meter();
        let mut io = io_buffer(0.5);
        engine.process_block(&mut io, &[]);
        assert_eq!(meter.input_peak(0), 0.5);
        assert!((meter.output_peak(0) - 0.5).abs() < 1e-6);
        assert_eq!(meter.output_peak(1), 0.0);
    }

    #[test]
    fn window_sizes_are_engine_owned() {
        let mut engine = prepared_engine();
        engine.set_window_size("gain", 320, 200);
        assert_eq!(engine.window_sizes().get("gain"), Some(&(320, 200)));

        engine.replace_window_sizes(BTreeMap::new());
        assert!(engine.window_sizes().is_empty());
    }

    #[test]
    fn permanent_cosmetics_survive_rebuild() {
        let mut engine = prepared_engine();
        let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        engine.set_position(input, 11.0, 22.0);
        engine.set_bypassed(input, true);

        engine.prepare(48_000.0, BLOCK, 2, 2, media::silence());
        let new_input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
        assert_eq!(engine.position(new_input), Some((11.0, 22.0)));
        assert!(engine.is_bypassed(new_input));
    }
}
