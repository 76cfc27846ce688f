//! The 16-slot workspace system.
//!
//! Each slot holds a complete [`GraphSnapshot`]; exactly one slot is active
//! and its snapshot is implicit (the live graph) until a switch or save
//! materializes it. Switching captures the outgoing graph **before**
//! anything is torn down, so the outgoing state is never lost - even when
//! the incoming slot is empty.

use std::path::Path;

use escena_core::AudioGraphEngine;
use serde::{Deserialize, Serialize};

use crate::serializer::{GraphSerializer, read_json, write_json};
use crate::snapshot::GraphSnapshot;

/// Number of workspace slots.
pub const MAX_WORKSPACES: usize = 16;

/// Bookkeeping for one slot.
#[derive(Debug, Clone)]
struct WorkspaceSlot {
    name: String,
    enabled: bool,
    occupied: bool,
    snapshot: Option<GraphSnapshot>,
}

impl WorkspaceSlot {
    fn default_for(index: usize) -> Self {
        Self {
            name: (index + 1).to_string(),
            enabled: index == 0,
            occupied: false,
            snapshot: None,
        }
    }
}

/// Persisted state of one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotState {
    /// Display name.
    pub name: String,
    /// Whether the slot can be switched to.
    pub enabled: bool,
    /// Whether the slot holds a captured snapshot.
    pub occupied: bool,
    /// The snapshot, when one exists (always present for the active slot).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<GraphSnapshot>,
}

/// Persisted state of the whole manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Index of the active slot.
    pub active: usize,
    /// All sixteen slots.
    pub slots: Vec<SlotState>,
}

/// Coordinates swapping the entire live graph for a saved one.
///
/// Every graph-touching method takes the engine explicitly; the manager owns
/// only slot bookkeeping and never caches live node state.
pub struct WorkspaceManager {
    slots: Vec<WorkspaceSlot>,
    active: usize,
}

impl WorkspaceManager {
    /// Creates the startup configuration: slots named "1".."16", only slot
    /// 0 enabled, none occupied, slot 0 active.
    pub fn new() -> Self {
        Self {
            slots: (0..MAX_WORKSPACES).map(WorkspaceSlot::default_for).collect(),
            active: 0,
        }
    }

    // --- Queries ---

    /// Index of the active slot.
    pub fn active_workspace(&self) -> usize {
        self.active
    }

    /// Whether a slot can be switched to.
    pub fn is_enabled(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.enabled)
    }

    /// Whether a slot holds a captured snapshot.
    pub fn is_occupied(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.occupied)
    }

    /// A slot's display name.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|s| s.name.as_str())
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    /// Renames a slot. Out-of-range indices are ignored.
    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.name = name.into();
        }
    }

    /// Enables or disables a slot. Out-of-range indices are ignored.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.enabled = enabled;
        }
    }

    // --- Operations ---

    /// Switches the live graph to another slot.
    ///
    /// No-op when `target` is out of range, already active, or disabled.
    /// Otherwise: the live graph is captured into the current active slot
    /// (which becomes occupied), live user nodes are cleared with hardware
    /// routing preserved, and - if the target is occupied - its snapshot is
    /// loaded. Idempotent on the already-active index.
    pub fn switch_workspace(&mut self, engine: &mut AudioGraphEngine, target: usize) {
        if target >= MAX_WORKSPACES || target == self.active || !self.slots[target].enabled {
            return;
        }

        // Capture before any teardown; the outgoing state must survive even
        // if the incoming slot is empty.
        self.slots[self.active].snapshot = Some(GraphSerializer::save_graph(engine));
        self.slots[self.active].occupied = true;

        engine.clear_user_nodes();

        if self.slots[target].occupied
            && let Some(snapshot) = self.slots[target].snapshot.clone()
        {
            GraphSerializer::load_graph(engine, &snapshot);
        }

        tracing::info!(from = self.active, to = target, "workspace switch");
        self.active = target;
    }

    /// Empties one slot. If it is the active slot, the live user nodes are
    /// cleared too. Name and enablement are kept.
    pub fn clear_workspace(&mut self, engine: &mut AudioGraphEngine, index: usize) {
        if index >= MAX_WORKSPACES {
            return;
        }
        if index == self.active {
            engine.clear_user_nodes();
        }
        self.slots[index].snapshot = None;
        self.slots[index].occupied = false;
    }

    /// Copies `src`'s snapshot (a fresh live capture when `src` is active)
    /// into `dst`, enabling `dst`. If `dst` is active, the copy is also
    /// loaded into the live graph immediately.
    pub fn duplicate_workspace(&mut self, engine: &mut AudioGraphEngine, src: usize, dst: usize) {
        if src >= MAX_WORKSPACES || dst >= MAX_WORKSPACES || src == dst {
            return;
        }

        let data = if src == self.active {
            Some(GraphSerializer::save_graph(engine))
        } else {
            self.slots[src].snapshot.clone()
        };

        if dst == self.active {
            engine.clear_user_nodes();
            if let Some(snapshot) = &data {
                GraphSerializer::load_graph(engine, snapshot);
            }
        }

        self.slots[dst].occupied = data.is_some();
        self.slots[dst].snapshot = data;
        self.slots[dst].enabled = true;
    }

    /// Clears the live user nodes and every slot, restoring startup
    /// defaults.
    pub fn reset_all(&mut self, engine: &mut AudioGraphEngine) {
        engine.clear_user_nodes();
        self.slots = (0..MAX_WORKSPACES).map(WorkspaceSlot::default_for).collect();
        self.active = 0;
    }

    // --- Persistence ---

    /// Serializes all sixteen slots plus the active index. The active
    /// slot's data is captured live.
    pub fn get_state(&self, engine: &AudioGraphEngine) -> WorkspaceState {
        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotState {
                name: slot.name.clone(),
                enabled: slot.enabled,
                occupied: slot.occupied,
                data: if i == self.active {
                    Some(GraphSerializer::save_graph(engine))
                } else if slot.occupied {
                    slot.snapshot.clone()
                } else {
                    None
                },
            })
            .collect();
        WorkspaceState {
            active: self.active,
            slots,
        }
    }

    /// Reconstructs slot bookkeeping from a persisted state, then loads the
    /// active slot's data into the live graph (the equivalent of switching
    /// to it). An out-of-range active index falls back to slot 0.
    pub fn restore_state(&mut self, engine: &mut AudioGraphEngine, state: &WorkspaceState) {
        self.active = if state.active < MAX_WORKSPACES {
            state.active
        } else {
            0
        };

        for i in 0..MAX_WORKSPACES {
            self.slots[i] = match state.slots.get(i) {
                Some(slot) => WorkspaceSlot {
                    name: slot.name.clone(),
                    enabled: slot.enabled,
                    occupied: slot.occupied,
                    snapshot: slot.data.clone(),
                },
                None => WorkspaceSlot::default_for(i),
            };
        }

        engine.clear_user_nodes();
        if let Some(snapshot) = self.slots[self.active].snapshot.clone() {
            GraphSerializer::load_graph(engine, &snapshot);
        }
    }

    /// Saves the whole manager state to a JSON file. Returns `false` on
    /// failure; never leaves a partially written file.
    pub fn save_to_file(&self, engine: &AudioGraphEngine, path: impl AsRef<Path>) -> bool {
        match write_json(path.as_ref(), &self.get_state(engine)) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, "failed to save workspaces");
                false
            }
        }
    }

    /// Loads the whole manager state from a JSON file. Returns `false` and
    /// leaves everything untouched on failure.
    pub fn load_from_file(&mut self, engine: &mut AudioGraphEngine, path: impl AsRef<Path>) -> bool {
        match read_json::<WorkspaceState>(path.as_ref()) {
            Ok(state) => {
                self.restore_state(engine, &state);
                true
            }
            Err(err) => {
                tracing::error!(%err, "failed to load workspaces");
                false
            }
        }
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escena_core::media;
    use escena_registry::builtin_registry;

    fn prepared_engine() -> AudioGraphEngine {
        let mut engine = AudioGraphEngine::new(builtin_registry());
        engine.prepare(48_000.0, 32, 2, 2, media::silence());
        engine
    }

    #[test]
    fn startup_defaults() {
        let manager = WorkspaceManager::new();
        assert_eq!(manager.active_workspace(), 0);
        assert_eq!(manager.occupied_count(), 0);
        assert!(manager.is_enabled(0));
        for i in 1..MAX_WORKSPACES {
            assert!(!manager.is_enabled(i));
            assert!(!manager.is_occupied(i));
        }
        assert_eq!(manager.name(0), Some("1"));
        assert_eq!(manager.name(15), Some("16"));
        assert_eq!(manager.name(16), None);
    }

    #[test]
    fn switch_guards() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        engine.add_effect("preamp", 0.0, 0.0).unwrap();

        // Out of range, already active, and disabled targets are no-ops.
        manager.switch_workspace(&mut engine, MAX_WORKSPACES);
        manager.switch_workspace(&mut engine, 0);
        manager.switch_workspace(&mut engine, 3);
        assert_eq!(manager.active_workspace(), 0);
        assert_eq!(manager.occupied_count(), 0);
        assert_eq!(engine.user_nodes().len(), 1, "live graph untouched");
    }

    #[test]
    fn switch_captures_outgoing_state() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        engine.add_effect("delay", 0.0, 0.0).unwrap();

        manager.set_enabled(1, true);
        manager.switch_workspace(&mut engine, 1);

        assert_eq!(manager.active_workspace(), 1);
        assert!(manager.is_occupied(0));
        assert!(!manager.is_occupied(1));
        assert!(engine.user_nodes().is_empty(), "empty slot loads empty");
        assert_eq!(engine.node_count(), 3, "permanent nodes stay");
    }

    #[test]
    fn clear_keeps_name_and_enablement() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        manager.set_name(2, "Chorus scene");
        manager.set_enabled(2, true);

        engine.add_effect("preamp", 0.0, 0.0).unwrap();
        manager.switch_workspace(&mut engine, 2);
        assert!(manager.is_occupied(0));

        manager.clear_workspace(&mut engine, 0);
        assert!(!manager.is_occupied(0));
        assert_eq!(manager.name(2), Some("Chorus scene"));
        assert!(manager.is_enabled(2));
    }

    #[test]
    fn clear_active_also_clears_live_nodes() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        engine.add_effect("preamp", 0.0, 0.0).unwrap();

        manager.clear_workspace(&mut engine, 0);
        assert!(engine.user_nodes().is_empty());
    }

    #[test]
    fn duplicate_from_active_copies_live_graph() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        engine.add_effect("gate", 0.0, 0.0).unwrap();

        manager.duplicate_workspace(&mut engine, 0, 5);
        assert!(manager.is_occupied(5));
        assert!(manager.is_enabled(5));

        // The copy is genuinely independent: switching to it restores the
        // same topology.
        manager.switch_workspace(&mut engine, 5);
        assert_eq!(engine.user_nodes().len(), 1);
    }

    #[test]
    fn duplicate_guards() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        manager.duplicate_workspace(&mut engine, 0, 0);
        manager.duplicate_workspace(&mut engine, 0, MAX_WORKSPACES);
        manager.duplicate_workspace(&mut engine, MAX_WORKSPACES, 0);
        assert_eq!(manager.occupied_count(), 0);
    }

    #[test]
    fn reset_all_restores_defaults() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        engine.add_effect("tone", 0.0, 0.0).unwrap();
        manager.set_enabled(1, true);
        manager.set_name(1, "Verse");
        manager.switch_workspace(&mut engine, 1);

        manager.reset_all(&mut engine);
        assert_eq!(manager.active_workspace(), 0);
        assert_eq!(manager.occupied_count(), 0);
        assert_eq!(manager.name(1), Some("2"));
        assert!(!manager.is_enabled(1));
        assert!(engine.user_nodes().is_empty());
    }

    #[test]
    fn occupied_count_only_rises_on_switch_and_duplicate() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        manager.set_enabled(1, true);
        manager.set_enabled(2, true);

        assert_eq!(manager.occupied_count(), 0);
        manager.switch_workspace(&mut engine, 1);
        assert_eq!(manager.occupied_count(), 1);
        manager.duplicate_workspace(&mut engine, 1, 3);
        assert_eq!(manager.occupied_count(), 2);
        manager.clear_workspace(&mut engine, 3);
        assert_eq!(manager.occupied_count(), 1);
        manager.reset_all(&mut engine);
        assert_eq!(manager.occupied_count(), 0);
    }

    #[test]
    fn restore_state_with_out_of_range_active_falls_back() {
        let mut engine = prepared_engine();
        let mut manager = WorkspaceManager::new();
        let mut state = manager.get_state(&engine);
        state.active = 99;

        manager.restore_state(&mut engine, &state);
        assert_eq!(manager.active_workspace(), 0);
    }
}
