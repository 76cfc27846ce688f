//! The mutable real-time audio processing graph.
//!
//! [`AudioGraphEngine`] owns the canonical node table and connection list.
//! Structural mutation (add/remove/rewire) happens on the control thread and
//! recomputes the topological render order; the audio thread calls
//! [`AudioGraphEngine::process_block`] once per hardware period and walks
//! that precomputed order with zero allocation.
//!
//! # Permanent nodes
//!
//! Three roles exist exactly once whenever the engine is prepared: hardware
//! input, hardware output, and playback (the media player source). Their
//! role is permanent; their identity is replaced whenever
//! [`prepare`](AudioGraphEngine::prepare) rebuilds them for new hardware
//! channel counts. The three ids live in one engine-owned handle that is
//! swapped as a unit, so the audio thread can only ever observe "all three
//! present" or "none" - never a half-rebuilt set.
//!
//! # Connections
//!
//! A [`Connection`] is a directed edge from one channel of a source node to
//! one channel of a destination node. Both endpoints exist in the node table
//! at all times: removing a node atomically removes every edge touching it,
//! and `add_connection` validates endpoints, channel ranges, duplicates, and
//! cycles before mutating anything.

mod connection;
mod engine;
mod io_nodes;
mod meter;

pub use connection::{Connection, Endpoint, NodeId};
pub use engine::{AudioGraphEngine, EngineState, GraphError, ZOMBIE_FLUSH_BLOCKS};
pub use io_nodes::NodeRole;
pub use meter::{MAX_METER_CHANNELS, PeakMeter};
