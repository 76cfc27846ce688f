//! The persisted snapshot shape.
//!
//! Connections are stored through **positional indices** into the node list,
//! never raw node ids - ids are not stable across a save/load boundary.
//! Negative sentinel indices stand in for the three permanent roles, which
//! are rebuilt by `prepare`, not restored from data.

use std::collections::BTreeMap;

use escena_core::NodeRole;
use serde::{Deserialize, Serialize};

/// Sentinel connection index for the hardware input role.
pub const HARDWARE_INPUT_INDEX: i32 = -1;
/// Sentinel connection index for the hardware output role.
pub const HARDWARE_OUTPUT_INDEX: i32 = -2;
/// Sentinel connection index for the playback role.
pub const PLAYBACK_INDEX: i32 = -3;

/// Maps a permanent role to its sentinel connection index.
pub fn role_to_index(role: NodeRole) -> i32 {
    match role {
        NodeRole::HardwareInput => HARDWARE_INPUT_INDEX,
        NodeRole::HardwareOutput => HARDWARE_OUTPUT_INDEX,
        NodeRole::Playback => PLAYBACK_INDEX,
    }
}

/// Maps a sentinel connection index back to its permanent role.
pub fn index_to_role(index: i32) -> Option<NodeRole> {
    match index {
        HARDWARE_INPUT_INDEX => Some(NodeRole::HardwareInput),
        HARDWARE_OUTPUT_INDEX => Some(NodeRole::HardwareOutput),
        PLAYBACK_INDEX => Some(NodeRole::Playback),
        _ => None,
    }
}

/// One non-permanent node in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// The node's stable type tag.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Canvas position.
    pub x: f32,
    /// Canvas position.
    pub y: f32,
    /// Bypass flag.
    #[serde(default)]
    pub bypassed: bool,
    /// Opaque parameter blob, exactly as the node exported it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<u8>,
}

/// One connection in a snapshot.
///
/// `src`/`dst` are positions in [`GraphSnapshot::nodes`], or negative
/// sentinels for permanent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConnection {
    /// Source node index.
    pub src: i32,
    /// Source channel.
    pub src_channel: usize,
    /// Destination node index.
    pub dst: i32,
    /// Destination channel.
    pub dst_channel: usize,
}

/// Cosmetic state of one permanent node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeCosmetics {
    /// Canvas position.
    pub x: f32,
    /// Canvas position.
    pub y: f32,
    /// Bypass flag.
    #[serde(default)]
    pub bypassed: bool,
}

/// Cosmetics for the three permanent roles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermanentCosmetics {
    /// Hardware input node.
    pub input: NodeCosmetics,
    /// Hardware output node.
    pub output: NodeCosmetics,
    /// Playback node.
    pub playback: NodeCosmetics,
}

/// Editor window size for one node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// An immutable, position-indexed capture of a live graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Non-permanent nodes, in table order.
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    /// Connections by positional index.
    #[serde(default)]
    pub connections: Vec<SnapshotConnection>,
    /// Permanent-node cosmetics, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent: Option<PermanentCosmetics>,
    /// Per-type editor window sizes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub window_sizes: BTreeMap<String, WindowSize>,
}

impl GraphSnapshot {
    /// Parses a snapshot from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_round_trip_through_roles() {
        for role in NodeRole::ALL {
            let index = role_to_index(role);
            assert!(index < 0, "sentinels must be negative");
            assert_eq!(index_to_role(index), Some(role));
        }
        assert_eq!(index_to_role(0), None);
        assert_eq!(index_to_role(-4), None);
    }

    #[test]
    fn snapshot_json_round_trip() {
        let snapshot = GraphSnapshot {
            nodes: vec![SnapshotNode {
                type_tag: "delay".to_owned(),
                x: 10.0,
                y: 20.0,
                bypassed: true,
                state: vec![1, 2, 3],
            }],
            connections: vec![SnapshotConnection {
                src: HARDWARE_INPUT_INDEX,
                src_channel: 0,
                dst: 0,
                dst_channel: 1,
            }],
            permanent: None,
            window_sizes: BTreeMap::from([(
                "delay".to_owned(),
                WindowSize {
                    width: 320,
                    height: 240,
                },
            )]),
        };

        let json = snapshot.to_json().unwrap();
        let parsed = GraphSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn missing_fields_default() {
        let parsed = GraphSnapshot::from_json(b"{}").unwrap();
        assert!(parsed.nodes.is_empty());
        assert!(parsed.connections.is_empty());
        assert!(parsed.permanent.is_none());
        assert!(parsed.window_sizes.is_empty());
    }

    #[test]
    fn node_type_serializes_as_type() {
        let node = SnapshotNode {
            type_tag: "gate".to_owned(),
            x: 0.0,
            y: 0.0,
            bypassed: false,
            state: Vec::new(),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"type\":\"gate\""), "got: {json}");
    }
}
