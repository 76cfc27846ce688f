//! Escena Core - the real-time audio graph engine for a live performance host.
//!
//! Singers and hosts route hardware microphones and a media player through a
//! chain of effect units and out to hardware outputs, reconfiguring the chain
//! while audio keeps streaming. This crate is the engine underneath that UI:
//!
//! - [`AudioNode`] - the capability contract every pluggable effect unit
//!   implements (prepare/process/release/state export/bus layout query)
//! - [`NodeRegistry`] - type-tag keyed factory table for effect units
//! - [`AudioGraphEngine`] - the canonical node table and connection list, with
//!   structural mutation on the control thread and a single per-block render
//!   entry point on the audio thread
//! - [`MediaSource`] - the seam through which the playback node pulls audio
//!   from an externally owned media player
//!
//! # Threading Model
//!
//! Two execution contexts share the engine: one real-time **audio thread**
//! calling [`AudioGraphEngine::process_block`] once per hardware period under
//! a hard deadline, and one **control thread** performing every structural
//! mutation, parameter edit, and workspace operation. Ownership makes the
//! single-writer rule structural (`&mut self` everywhere); the host hands the
//! engine to its audio callback and routes control edits through its own
//! channel. `process_block` itself never allocates, locks, or logs, and
//! degrades to silence rather than crash when it observes a mid-rebuild
//! state.
//!
//! # Device Hot-Swap
//!
//! [`AudioGraphEngine::prepare`] is idempotent and callable repeatedly. Later
//! calls rebuild only the three permanent nodes (hardware input, hardware
//! output, playback) to match the new channel counts, preserving every user
//! node and user-to-user wire, and replaying hardware wires whose channel
//! still exists. A short forced-silence countdown
//! ([`AudioGraphEngine::flush_buffers`]) defends against stale samples
//! surviving a device restart.
//!
//! # Example
//!
//! ```rust,ignore
//! use escena_core::{AudioGraphEngine, Connection, NodeRole};
//!
//! let mut engine = AudioGraphEngine::new(registry);
//! engine.prepare(48_000.0, 256, 2, 2, escena_core::media::silence());
//!
//! let delay = engine.add_effect("delay", 300.0, 200.0).unwrap();
//! let input = engine.permanent_node(NodeRole::HardwareInput).unwrap();
//! let output = engine.permanent_node(NodeRole::HardwareOutput).unwrap();
//! engine.add_connection(Connection::new(input, 0, delay, 0))?;
//! engine.add_connection(Connection::new(delay, 0, output, 0))?;
//!
//! // audio thread, once per hardware period:
//! engine.process_block(&mut io_buffer, &midi);
//! ```

pub mod buffer;
pub mod graph;
pub mod media;
pub mod midi;
pub mod node;
pub mod param;
pub mod registry;

pub use buffer::AudioBuffer;
pub use graph::{
    AudioGraphEngine, Connection, Endpoint, EngineState, GraphError, MAX_METER_CHANNELS, NodeId,
    NodeRole, PeakMeter, ZOMBIE_FLUSH_BLOCKS,
};
pub use media::{MediaSource, SharedMediaSource, SilenceSource};
pub use midi::MidiEvent;
pub use node::{
    AudioNode, BusLayout, HARDWARE_INPUT_TAG, HARDWARE_OUTPUT_TAG, PLAYBACK_TAG, is_reserved_tag,
};
pub use param::SmoothedParam;
pub use registry::{NodeCategory, NodeDescriptor, NodeRegistry};
