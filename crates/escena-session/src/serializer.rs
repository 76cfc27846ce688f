//! Bidirectional mapping between a live engine and a [`GraphSnapshot`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use escena_core::{AudioGraphEngine, Connection, NodeId, NodeRole};

use crate::error::SessionError;
use crate::snapshot::{
    GraphSnapshot, NodeCosmetics, PermanentCosmetics, SnapshotConnection, SnapshotNode,
    WindowSize, index_to_role, role_to_index,
};

/// Stateless save/load operations over an
/// [`AudioGraphEngine`](escena_core::AudioGraphEngine).
pub struct GraphSerializer;

impl GraphSerializer {
    /// Captures the live graph into a snapshot.
    ///
    /// Non-permanent nodes are recorded in table order with their opaque
    /// state blobs; permanent nodes contribute only sentinel indices and
    /// cosmetics, since `prepare` rebuilds them from the hardware
    /// configuration rather than from data.
    pub fn save_graph(engine: &AudioGraphEngine) -> GraphSnapshot {
        let user = engine.user_nodes();
        let index_of: HashMap<NodeId, i32> = user
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i as i32))
            .collect();

        let nodes = user
            .iter()
            .map(|&id| {
                let (x, y) = engine.position(id).unwrap_or((0.0, 0.0));
                SnapshotNode {
                    type_tag: engine.effect_type(id).unwrap_or_default().to_owned(),
                    x,
                    y,
                    bypassed: engine.is_bypassed(id),
                    state: engine.node_state(id).unwrap_or_default(),
                }
            })
            .collect();

        let endpoint_index = |id: NodeId| -> Option<i32> {
            engine
                .node_role(id)
                .map(role_to_index)
                .or_else(|| index_of.get(&id).copied())
        };
        let connections = engine
            .connections()
            .iter()
            .filter_map(|c| {
                Some(SnapshotConnection {
                    src: endpoint_index(c.source.node)?,
                    src_channel: c.source.channel,
                    dst: endpoint_index(c.dest.node)?,
                    dst_channel: c.dest.channel,
                })
            })
            .collect();

        let cosmetics_for = |role: NodeRole| -> NodeCosmetics {
            let id = engine.permanent_node(role);
            let (x, y) = id
                .and_then(|id| engine.position(id))
                .unwrap_or((0.0, 0.0));
            NodeCosmetics {
                x,
                y,
                bypassed: id.is_some_and(|id| engine.is_bypassed(id)),
            }
        };
        let permanent = engine.is_prepared().then(|| PermanentCosmetics {
            input: cosmetics_for(NodeRole::HardwareInput),
            output: cosmetics_for(NodeRole::HardwareOutput),
            playback: cosmetics_for(NodeRole::Playback),
        });

        let window_sizes = engine
            .window_sizes()
            .iter()
            .map(|(tag, &(width, height))| (tag.clone(), WindowSize { width, height }))
            .collect();

        GraphSnapshot {
            nodes,
            connections,
            permanent,
            window_sizes,
        }
    }

    /// Replaces the live user topology with the snapshot's.
    ///
    /// The snapshot is validated in full before the engine is touched: every
    /// connection index must resolve to a sentinel or an in-range node, and
    /// every type tag must be known to the engine's registry. A malformed
    /// snapshot returns `false` and leaves the previously active state
    /// intact. After validation, individually unsatisfiable connections
    /// (e.g. a hardware channel lost to a device shrink) are skipped, not
    /// fatal.
    pub fn load_graph(engine: &mut AudioGraphEngine, snapshot: &GraphSnapshot) -> bool {
        if !engine.is_prepared() {
            return false;
        }

        // Validate offline first; nothing below this block may fail.
        let node_count = snapshot.nodes.len() as i32;
        for node in &snapshot.nodes {
            if !engine.registry().contains(&node.type_tag) {
                tracing::warn!(tag = %node.type_tag, "snapshot references unknown node type");
                return false;
            }
        }
        for c in &snapshot.connections {
            for index in [c.src, c.dst] {
                let valid = index_to_role(index).is_some() || (0..node_count).contains(&index);
                if !valid {
                    tracing::warn!(index, "snapshot connection index out of range");
                    return false;
                }
            }
        }

        // Apply: clear user nodes, recreate in snapshot order, then rewire.
        engine.clear_user_nodes();

        let mut id_map: Vec<Option<NodeId>> = Vec::with_capacity(snapshot.nodes.len());
        for node in &snapshot.nodes {
            match engine.add_effect(&node.type_tag, node.x, node.y) {
                Some(id) => {
                    engine.set_bypassed(id, node.bypassed);
                    if !node.state.is_empty() {
                        engine.set_node_state(id, &node.state);
                    }
                    id_map.push(Some(id));
                }
                None => id_map.push(None),
            }
        }

        for c in &snapshot.connections {
            let src = resolve_index(engine, &id_map, c.src);
            let dst = resolve_index(engine, &id_map, c.dst);
            let (Some(src), Some(dst)) = (src, dst) else {
                continue;
            };
            if let Err(err) =
                engine.add_connection(Connection::new(src, c.src_channel, dst, c.dst_channel))
            {
                tracing::debug!(%err, "skipping unsatisfiable snapshot connection");
            }
        }

        if let Some(cosmetics) = &snapshot.permanent {
            for (role, c) in [
                (NodeRole::HardwareInput, cosmetics.input),
                (NodeRole::HardwareOutput, cosmetics.output),
                (NodeRole::Playback, cosmetics.playback),
            ] {
                if let Some(id) = engine.permanent_node(role) {
                    engine.set_position(id, c.x, c.y);
                    engine.set_bypassed(id, c.bypassed);
                }
            }
        }

        let window_sizes: BTreeMap<String, (u32, u32)> = snapshot
            .window_sizes
            .iter()
            .map(|(tag, size)| (tag.clone(), (size.width, size.height)))
            .collect();
        engine.replace_window_sizes(window_sizes);

        true
    }

    /// Saves the live graph to a JSON file. Returns `false` on failure; a
    /// failed save never leaves a partially written file.
    pub fn save_to_file(engine: &AudioGraphEngine, path: impl AsRef<Path>) -> bool {
        match write_json(path.as_ref(), &Self::save_graph(engine)) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, "failed to save graph snapshot");
                false
            }
        }
    }

    /// Loads a JSON snapshot file into the live graph. Returns `false` on
    /// I/O failure, parse failure, or a malformed snapshot.
    pub fn load_from_file(engine: &mut AudioGraphEngine, path: impl AsRef<Path>) -> bool {
        match read_json::<GraphSnapshot>(path.as_ref()) {
            Ok(snapshot) => Self::load_graph(engine, &snapshot),
            Err(err) => {
                tracing::error!(%err, "failed to load graph snapshot");
                false
            }
        }
    }
}

fn resolve_index(
    engine: &AudioGraphEngine,
    id_map: &[Option<NodeId>],
    index: i32,
) -> Option<NodeId> {
    match index_to_role(index) {
        Some(role) => engine.permanent_node(role),
        None => id_map.get(usize::try_from(index).ok()?).copied().flatten(),
    }
}

/// Serializes `value` next to `path`, then renames into place.
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), SessionError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| SessionError::create_dir(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &bytes).map_err(|e| SessionError::write_file(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| SessionError::write_file(path, e))?;
    Ok(())
}

/// Reads and parses a JSON file.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SessionError> {
    let bytes = std::fs::read(path).map_err(|e| SessionError::read_file(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}
