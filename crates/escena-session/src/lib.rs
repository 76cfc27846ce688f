//! Escena Session - graph snapshots and the 16-slot workspace system.
//!
//! A [`GraphSnapshot`] is an immutable, position-indexed capture of a live
//! graph: non-permanent nodes in order, connections expressed through
//! positional indices (with reserved sentinels for the permanent roles), and
//! cosmetic extras. [`GraphSerializer`] maps a live
//! [`AudioGraphEngine`](escena_core::AudioGraphEngine) to and from that
//! shape; [`WorkspaceManager`] coordinates sixteen named slots of snapshots
//! that a performer switches between as scenes, mid-show, while audio keeps
//! streaming.
//!
//! Everything persists as JSON. File writes go through a temp-and-rename
//! sequence so a failed save never leaves a corrupt file behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use escena_core::AudioGraphEngine;
//! use escena_registry::builtin_registry;
//! use escena_session::{GraphSerializer, WorkspaceManager};
//!
//! let mut engine = AudioGraphEngine::new(builtin_registry());
//! engine.prepare(48_000.0, 256, 2, 2, escena_core::media::silence());
//!
//! let mut workspaces = WorkspaceManager::new();
//! workspaces.set_enabled(1, true);
//! workspaces.switch_workspace(&mut engine, 1);
//!
//! let snapshot = GraphSerializer::save_graph(&engine);
//! assert!(GraphSerializer::load_graph(&mut engine, &snapshot));
//! ```

mod error;
mod serializer;
mod snapshot;
mod workspace;

/// Platform-specific directories for workspace files.
pub mod paths;

pub use error::SessionError;
pub use serializer::GraphSerializer;
pub use snapshot::{
    GraphSnapshot, HARDWARE_INPUT_INDEX, HARDWARE_OUTPUT_INDEX, NodeCosmetics, PLAYBACK_INDEX,
    PermanentCosmetics, SnapshotConnection, SnapshotNode, WindowSize, index_to_role,
    role_to_index,
};
pub use workspace::{MAX_WORKSPACES, SlotState, WorkspaceManager, WorkspaceState};
