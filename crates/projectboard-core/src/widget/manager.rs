//! Widget manager for tracking selection and edit focus.

use super::state::WidgetState;
use crate::shapes::ShapeId;
use std::collections::{HashMap, HashSet};

/// Tracks selection and text editing for the objects on a surface.
///
/// Selection holds top-level object ids. The focused id may name a text
/// object nested inside a group.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    states: HashMap<ShapeId, WidgetState>,
    selected: HashSet<ShapeId>,
    focused: Option<ShapeId>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of an object.
    pub fn state(&self, id: ShapeId) -> WidgetState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    fn set_state(&mut self, id: ShapeId, state: WidgetState) {
        if state.is_selected() {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }

        if state.is_editing() {
            self.focused = Some(id);
        } else if self.focused == Some(id) {
            self.focused = None;
        }

        if state == WidgetState::Normal {
            self.states.remove(&id);
        } else {
            self.states.insert(id, state);
        }
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected(&self) -> &HashSet<ShapeId> {
        &self.selected
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Get the focused text object (if any).
    pub fn focused(&self) -> Option<ShapeId> {
        self.focused
    }

    /// Select a single object (clears other selections).
    pub fn select(&mut self, id: ShapeId) {
        self.clear_selection();
        self.add_to_selection(id);
    }

    /// Replace the selection with `ids`.
    pub fn select_all<I: IntoIterator<Item = ShapeId>>(&mut self, ids: I) {
        self.clear_selection();
        for id in ids {
            self.add_to_selection(id);
        }
    }

    pub fn add_to_selection(&mut self, id: ShapeId) {
        if !self.is_editing_shape(id) {
            self.set_state(id, WidgetState::Selected);
        }
    }

    /// Clear all selections, leaving text editing as well.
    pub fn clear_selection(&mut self) {
        let ids: Vec<_> = self.states.keys().copied().collect();
        for id in ids {
            self.set_state(id, WidgetState::Normal);
        }
    }

    /// Give keyboard focus to a text object.
    pub fn enter_editing(&mut self, id: ShapeId) {
        if let Some(old) = self.focused {
            if old != id {
                self.exit_editing();
            }
        }
        self.set_state(id, WidgetState::Editing);
    }

    /// Drop keyboard focus; the edited object stays selected.
    pub fn exit_editing(&mut self) -> bool {
        match self.focused {
            Some(id) => {
                self.set_state(id, WidgetState::Selected);
                true
            }
            None => false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.focused.is_some()
    }

    pub fn is_editing_shape(&self, id: ShapeId) -> bool {
        self.focused == Some(id)
    }

    /// Remove state for a deleted object.
    pub fn remove(&mut self, id: ShapeId) {
        self.set_state(id, WidgetState::Normal);
    }

    /// Drop state for objects for which `exists` returns false.
    pub fn retain<F: Fn(ShapeId) -> bool>(&mut self, exists: F) {
        let stale: Vec<_> = self.states.keys().copied().filter(|id| !exists(*id)).collect();
        for id in stale {
            self.remove(id);
        }
    }
}
